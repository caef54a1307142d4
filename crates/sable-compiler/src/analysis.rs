//! Await-site and variable analysis.
//!
//! Before an async body is lowered, `analyze_awaits` walks it in
//! evaluation order and numbers every `await` site (the lowering
//! allocates resume states in the same order, one state per site).
//! For each site it records the locals that are live across it — a
//! local defined before the await and used after it must survive
//! suspension on the machine. The machine stores the whole frame, so
//! the live set does not drive storage, but it sizes the captures the
//! transform reports and pins down the invariant tests check.
//!
//! `free_variables` supports closure conversion: it collects the
//! names an arrow body uses without binding, which the enclosing
//! function must supply as captures.

use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::{ArrowBody, Expression, Param, Statement, TemplatePart};

/// One await site within an async body.
#[derive(Debug, Clone)]
pub struct AwaitSite {
    /// Resume state allocated to this site (0-based, allocation in
    /// evaluation order).
    pub index: u16,
    /// Locals (and parameters) live across this suspension point.
    pub live_locals: FxHashSet<String>,
}

/// Result of analyzing an async body.
#[derive(Debug, Clone, Default)]
pub struct AwaitAnalysis {
    /// All await sites, ordered by index.
    pub sites: Vec<AwaitSite>,
}

impl AwaitAnalysis {
    /// Whether the body can suspend at all.
    pub fn has_awaits(&self) -> bool {
        !self.sites.is_empty()
    }

    /// Number of distinct resume states the machine needs.
    pub fn state_count(&self) -> u16 {
        self.sites.len() as u16
    }
}

/// Walk a body in evaluation order and number its await sites.
pub fn analyze_awaits(params: &[Param], body: &[Statement]) -> AwaitAnalysis {
    let mut walker = AwaitWalker::default();
    for param in params {
        walker.def(&param.name);
    }
    for stmt in body {
        walker.stmt(stmt);
    }
    walker.finish()
}

/// Event-stream liveness: a name is live across a site when some
/// definition precedes the site and some use follows it. This is a
/// linearization of the body (branches concatenated), which
/// over-approximates — safe for deciding what must survive.
#[derive(Default)]
struct AwaitWalker {
    pos: u32,
    defs: FxHashMap<String, u32>,
    uses: FxHashMap<String, Vec<u32>>,
    awaits: Vec<u32>,
}

impl AwaitWalker {
    fn tick(&mut self) -> u32 {
        self.pos += 1;
        self.pos
    }

    fn def(&mut self, name: &str) {
        let pos = self.tick();
        self.defs.entry(name.to_string()).or_insert(pos);
    }

    fn use_(&mut self, name: &str) {
        let pos = self.tick();
        self.uses.entry(name.to_string()).or_default().push(pos);
    }

    fn await_site(&mut self) {
        let pos = self.tick();
        self.awaits.push(pos);
    }

    fn stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.expr(init);
                }
                self.def(&decl.name);
            }
            Statement::Return(expr) => {
                if let Some(expr) = expr {
                    self.expr(expr);
                }
            }
            Statement::Expression(expr) | Statement::Throw(expr) => self.expr(expr),
            Statement::If(if_stmt) => {
                self.expr(&if_stmt.condition);
                for s in &if_stmt.then_branch {
                    self.stmt(s);
                }
                if let Some(else_branch) = &if_stmt.else_branch {
                    for s in else_branch {
                        self.stmt(s);
                    }
                }
            }
            Statement::While(while_stmt) => {
                self.expr(&while_stmt.condition);
                for s in &while_stmt.body {
                    self.stmt(s);
                }
                // Loop back-edge: condition and body values are used
                // again on the next iteration.
                self.expr(&while_stmt.condition);
            }
            Statement::For(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    self.stmt(init);
                }
                if let Some(condition) = &for_stmt.condition {
                    self.expr(condition);
                }
                for s in &for_stmt.body {
                    self.stmt(s);
                }
                if let Some(update) = &for_stmt.update {
                    self.expr(update);
                }
                if let Some(condition) = &for_stmt.condition {
                    self.expr(condition);
                }
            }
            Statement::Try(try_stmt) => {
                for s in &try_stmt.body {
                    self.stmt(s);
                }
                self.def(&try_stmt.catch_param);
                for s in &try_stmt.catch_body {
                    self.stmt(s);
                }
            }
            // Nested declarations do not occur below the top level.
            Statement::Class(_) | Statement::Function(_) => {}
        }
    }

    fn expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) | Expression::This | Expression::Super => {}
            Expression::Identifier(name) => self.use_(name),
            Expression::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Expr(e) = part {
                        self.expr(e);
                    }
                }
            }
            Expression::ArrayLit(elements) => {
                for e in elements {
                    self.expr(e);
                }
            }
            Expression::ObjectLit(props) => {
                for (_, e) in props {
                    self.expr(e);
                }
            }
            Expression::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expression::Unary { operand, .. } => self.expr(operand),
            Expression::Assign { target, value } => {
                // Assignment to a bare name is a definition; member
                // and index targets evaluate their object parts.
                match &**target {
                    Expression::Identifier(name) => {
                        self.expr(value);
                        self.def(name);
                    }
                    Expression::Member { object, .. } => {
                        self.expr(object);
                        self.expr(value);
                    }
                    Expression::Index { object, index } => {
                        self.expr(object);
                        self.expr(index);
                        self.expr(value);
                    }
                    other => {
                        self.expr(other);
                        self.expr(value);
                    }
                }
            }
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(condition);
                self.expr(then_expr);
                self.expr(else_expr);
            }
            Expression::Call { callee, args } => {
                match &**callee {
                    // A named call uses the name only if it is a
                    // local; harmless to record either way.
                    Expression::Identifier(name) => self.use_(name),
                    Expression::Member { object, .. } => {
                        if !matches!(&**object, Expression::Super) {
                            self.expr(object);
                        }
                    }
                    Expression::Super => {}
                    other => self.expr(other),
                }
                for arg in args {
                    self.expr(arg);
                }
            }
            Expression::Member { object, .. } => self.expr(object),
            Expression::Index { object, index } => {
                self.expr(object);
                self.expr(index);
            }
            Expression::Await(inner) => {
                self.expr(inner);
                self.await_site();
            }
            Expression::New { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            Expression::Arrow { params, body, .. } => {
                // Captured names are read at closure creation; the
                // arrow's own awaits belong to its own machine.
                let (free, _uses_this) = free_variables(params, &arrow_body_statements(body));
                for name in free {
                    self.use_(&name);
                }
            }
            Expression::Assert(inner) | Expression::NonNull(inner) => self.expr(inner),
            Expression::Cast { expr, .. } => self.expr(expr),
        }
    }

    fn finish(self) -> AwaitAnalysis {
        let sites = self
            .awaits
            .iter()
            .enumerate()
            .map(|(index, &await_pos)| {
                let mut live_locals = FxHashSet::default();
                for (name, &def_pos) in &self.defs {
                    if def_pos >= await_pos {
                        continue;
                    }
                    let used_after = self
                        .uses
                        .get(name)
                        .is_some_and(|positions| positions.iter().any(|&p| p > await_pos));
                    if used_after {
                        live_locals.insert(name.clone());
                    }
                }
                AwaitSite {
                    index: index as u16,
                    live_locals,
                }
            })
            .collect();
        AwaitAnalysis { sites }
    }
}

fn arrow_body_statements(body: &ArrowBody) -> Vec<Statement> {
    match body {
        ArrowBody::Expr(expr) => vec![Statement::Return(Some((**expr).clone()))],
        ArrowBody::Block(stmts) => stmts.clone(),
    }
}

/// Names an arrow body reads without binding, in first-use order,
/// plus whether it references `this`. The enclosing function resolves
/// each name; those that are locals there become captures.
pub fn free_variables(params: &[Param], body: &[Statement]) -> (Vec<String>, bool) {
    let mut collector = FreeVars {
        bound: vec![params.iter().map(|p| p.name.clone()).collect()],
        free: Vec::new(),
        seen: FxHashSet::default(),
        uses_this: false,
    };
    for stmt in body {
        collector.stmt(stmt);
    }
    (collector.free, collector.uses_this)
}

struct FreeVars {
    bound: Vec<FxHashSet<String>>,
    free: Vec<String>,
    seen: FxHashSet<String>,
    uses_this: bool,
}

impl FreeVars {
    fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|scope| scope.contains(name))
    }

    fn bind(&mut self, name: &str) {
        if let Some(scope) = self.bound.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn reference(&mut self, name: &str) {
        if !self.is_bound(name) && self.seen.insert(name.to_string()) {
            self.free.push(name.to_string());
        }
    }

    fn stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.expr(init);
                }
                self.bind(&decl.name);
            }
            Statement::Return(Some(expr))
            | Statement::Expression(expr)
            | Statement::Throw(expr) => self.expr(expr),
            Statement::Return(None) => {}
            Statement::If(if_stmt) => {
                self.expr(&if_stmt.condition);
                self.block(&if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.block(else_branch);
                }
            }
            Statement::While(while_stmt) => {
                self.expr(&while_stmt.condition);
                self.block(&while_stmt.body);
            }
            Statement::For(for_stmt) => {
                self.bound.push(FxHashSet::default());
                if let Some(init) = &for_stmt.init {
                    self.stmt(init);
                }
                if let Some(condition) = &for_stmt.condition {
                    self.expr(condition);
                }
                if let Some(update) = &for_stmt.update {
                    self.expr(update);
                }
                self.block(&for_stmt.body);
                self.bound.pop();
            }
            Statement::Try(try_stmt) => {
                self.block(&try_stmt.body);
                self.bound.push(FxHashSet::default());
                self.bind(&try_stmt.catch_param);
                for s in &try_stmt.catch_body {
                    self.stmt(s);
                }
                self.bound.pop();
            }
            Statement::Class(_) | Statement::Function(_) => {}
        }
    }

    fn block(&mut self, stmts: &[Statement]) {
        self.bound.push(FxHashSet::default());
        for stmt in stmts {
            self.stmt(stmt);
        }
        self.bound.pop();
    }

    fn expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) | Expression::Super => {}
            Expression::This => self.uses_this = true,
            Expression::Identifier(name) => self.reference(name),
            Expression::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Expr(e) = part {
                        self.expr(e);
                    }
                }
            }
            Expression::ArrayLit(elements) => {
                for e in elements {
                    self.expr(e);
                }
            }
            Expression::ObjectLit(props) => {
                for (_, e) in props {
                    self.expr(e);
                }
            }
            Expression::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expression::Unary { operand, .. } => self.expr(operand),
            Expression::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(condition);
                self.expr(then_expr);
                self.expr(else_expr);
            }
            Expression::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expression::Member { object, .. } => self.expr(object),
            Expression::Index { object, index } => {
                self.expr(object);
                self.expr(index);
            }
            Expression::Await(inner) => self.expr(inner),
            Expression::New { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            Expression::Arrow { params, body, .. } => {
                let (free, uses_this) = free_variables(params, &arrow_body_statements(body));
                for name in free {
                    self.reference(&name);
                }
                self.uses_this |= uses_this;
            }
            Expression::Assert(inner) | Expression::NonNull(inner) => self.expr(inner),
            Expression::Cast { expr, .. } => self.expr(expr),
        }
    }
}
