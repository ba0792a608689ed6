//! Statement execution

use super::{EvalResult, Exception, ExecResult, Flow, Interpreter, Signal};
use crate::parser::ast::{
    AssignOperator, Assignment, BinaryOperator, BindingKind, Block, CasePattern, Expression,
    ForInStatement, LoopStatement, SelectCaseKind, SelectStatement, Statement, SwitchStatement,
    TryStatement,
};
use crate::vm::env::{Deferred, Env};
use crate::vm::object::CollectionData;
use crate::vm::sync::{select, SelectArm, Selected};
use crate::vm::types::generics::{canonicalize, instance_of, type_name};
use crate::vm::types::TypeBindings;
use crate::vm::value::{Function, FunctionBody, Value};
use crate::vm::VmError;
use std::sync::Arc;

/// Statements other than expression statements complete with `nil`.
fn discard_value(flow: Flow) -> Flow {
    match flow {
        Flow::Value(_) => Flow::Value(Value::Nil),
        other => other,
    }
}

impl Interpreter {
    /// Run statements in `env`, yielding the value of the last one.
    pub(crate) fn exec_statements(&self, statements: &[Statement], env: &Env) -> ExecResult {
        let mut last = Value::Nil;
        for statement in statements {
            match self.exec_statement(statement, env)? {
                Flow::Value(value) => last = value,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Value(last))
    }

    /// Run a block in `env`. Callers create the block's scope.
    pub fn exec_block(&self, block: &Block, env: &Env) -> ExecResult {
        self.exec_statements(&block.statements, env)
    }

    pub fn exec_statement(&self, statement: &Statement, env: &Env) -> ExecResult {
        self.dispatch_statement(statement, env).map_err(|mut fault| {
            fault.locate(*statement.span());
            fault
        })
    }

    fn dispatch_statement(&self, statement: &Statement, env: &Env) -> ExecResult {
        match statement {
            Statement::Expression(stmt) => Ok(Flow::Value(try_flow!(self.eval(&stmt.expression, env)))),

            Statement::VariableDecl(decl) => {
                let value = match &decl.initializer {
                    Some(init) => try_flow!(self.eval(init, env)),
                    None => Value::Nil,
                };
                let declared = decl.type_annotation.as_ref().map(canonicalize);
                if let Some(ty) = &declared {
                    let bindings = self.receiver_bindings(env);
                    self.check_value(&value, ty, &bindings, || format!("variable '{}'", decl.name))?;
                }
                env.define_typed(decl.name.clone(), value, decl.kind, declared);
                Ok(Flow::Value(Value::Nil))
            }

            Statement::Assignment(assignment) => {
                try_flow!(self.assign(assignment, env));
                Ok(Flow::Value(Value::Nil))
            }

            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(value) => try_flow!(self.eval(value, env)),
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Statement::FunctionDecl(decl) => {
                let function = Function {
                    name: decl.name.clone(),
                    type_params: decl.type_params.clone(),
                    params: decl.params.clone(),
                    return_type: decl.return_type.as_ref().map(canonicalize),
                    body: FunctionBody::Block(Arc::clone(&decl.body)),
                    closure: env.clone(),
                };
                env.define(decl.name.clone(), Value::Function(Arc::new(function)), BindingKind::Var);
                Ok(Flow::Value(Value::Nil))
            }

            Statement::If(stmt) => {
                if try_flow!(self.eval(&stmt.condition, env)).is_truthy() {
                    return self.exec_block(&stmt.then_branch, &env.child()).map(discard_value);
                }
                for (condition, block) in &stmt.elif_branches {
                    if try_flow!(self.eval(condition, env)).is_truthy() {
                        return self.exec_block(block, &env.child()).map(discard_value);
                    }
                }
                match &stmt.else_branch {
                    Some(block) => self.exec_block(block, &env.child()).map(discard_value),
                    None => Ok(Flow::Value(Value::Nil)),
                }
            }

            Statement::ForIn(stmt) => self.exec_for_in(stmt, env),
            Statement::Loop(stmt) => self.exec_loop(stmt, env),
            Statement::Break(_) => Ok(Flow::Break),
            Statement::Continue(_) => Ok(Flow::Continue),
            Statement::Try(stmt) => self.exec_try(stmt, env),

            Statement::Throw(stmt) => {
                let value = try_flow!(self.eval(&stmt.value, env));
                Ok(Flow::Thrown(Exception::new(value, Some(stmt.span))))
            }

            Statement::Defer(stmt) => {
                env.push_defer(Deferred {
                    call: stmt.call.clone(),
                    env: env.clone(),
                    span: stmt.span,
                });
                Ok(Flow::Value(Value::Nil))
            }

            Statement::ClassDecl(decl) => {
                try_flow!(self.declare_class(decl, env));
                Ok(Flow::Value(Value::Nil))
            }
            Statement::InterfaceDecl(decl) => {
                try_flow!(self.declare_interface(decl, env));
                Ok(Flow::Value(Value::Nil))
            }
            Statement::EnumDecl(decl) => {
                try_flow!(self.declare_enum(decl, env));
                Ok(Flow::Value(Value::Nil))
            }
            Statement::RecordDecl(decl) => {
                try_flow!(self.declare_record(decl, env));
                Ok(Flow::Value(Value::Nil))
            }

            Statement::Select(stmt) => self.exec_select(stmt, env),
            Statement::Switch(stmt) => self.exec_switch(stmt, env),

            Statement::Import(decl) => {
                match self.state.globals().lookup(&decl.name) {
                    Some(Value::Module(_)) => {}
                    _ => {
                        return Err(VmError::Runtime(format!("unknown module '{}'", decl.name)).into())
                    }
                }
                let alias = decl.alias.clone().unwrap_or_else(|| decl.name.clone());
                env.add_import(alias, decl.name.clone());
                Ok(Flow::Value(Value::Nil))
            }
        }
    }

    /// Type bindings of the method running in `env`, if any.
    pub(crate) fn receiver_bindings(&self, env: &Env) -> TypeBindings {
        match env.receiver() {
            Some(receiver) => match &receiver.this {
                Value::Object(inst) => {
                    crate::vm::types::generics::bindings_for(inst, &receiver.class.name)
                }
                _ => TypeBindings::default(),
            },
            None => TypeBindings::default(),
        }
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn assign(&self, assignment: &Assignment, env: &Env) -> EvalResult<()> {
        let rhs = self.eval(&assignment.value, env)?;
        let operator = match assignment.operator {
            AssignOperator::Assign => None,
            AssignOperator::Add => Some(BinaryOperator::Add),
            AssignOperator::Subtract => Some(BinaryOperator::Subtract),
            AssignOperator::Multiply => Some(BinaryOperator::Multiply),
            AssignOperator::Divide => Some(BinaryOperator::Divide),
        };

        match &assignment.target {
            Expression::Identifier(ident) => {
                let value = match operator {
                    Some(op) => self.binary_op(op, env.get(&ident.name)?, rhs)?,
                    None => rhs,
                };
                if let Some(ty) = env.declared_type(&ident.name) {
                    let bindings = self.receiver_bindings(env);
                    self.check_value(&value, &ty, &bindings, || format!("variable '{}'", ident.name))?;
                }
                env.set(&ident.name, value)?;
                Ok(())
            }
            Expression::Member(member) => {
                let object = self.eval(&member.object, env)?;
                let value = match operator {
                    Some(op) => {
                        let current = self.get_member(&object, &member.property, env)?;
                        self.binary_op(op, current, rhs)?
                    }
                    None => rhs,
                };
                self.set_member(&object, &member.property, value, env)
            }
            Expression::Index(index) => {
                let object = self.eval(&index.object, env)?;
                let key = self.eval(&index.index, env)?;
                let value = match operator {
                    Some(op) => {
                        let current = self.get_index(&object, &key)?;
                        self.binary_op(op, current, rhs)?
                    }
                    None => rhs,
                };
                self.set_index(&object, key, value)
            }
            _ => Err(VmError::Runtime("invalid assignment target".to_string()).into()),
        }
    }

    // ========================================================================
    // Loops
    // ========================================================================

    fn exec_for_in(&self, stmt: &ForInStatement, env: &Env) -> ExecResult {
        let iterable = try_flow!(self.eval(&stmt.iterable, env));

        if let Value::Channel(channel) = &iterable {
            let mut index = 0i64;
            while let Some(item) = channel.recv() {
                match self.iterate(stmt, env, Value::Int(index), item, false)? {
                    Flow::Break => break,
                    Flow::Value(_) | Flow::Continue => {}
                    other => return Ok(other),
                }
                index += 1;
            }
            return Ok(Flow::Value(Value::Nil));
        }

        let (items, keyed) = match self.iteration_items(&iterable) {
            Ok(items) => items,
            Err(error) => return Err(error.into()),
        };
        for (key, item) in items {
            match self.iterate(stmt, env, key, item, keyed)? {
                Flow::Break => break,
                Flow::Value(_) | Flow::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Value(Value::Nil))
    }

    /// `(key, item)` pairs of an iterable and whether a single binding
    /// receives the key (maps) rather than the item.
    fn iteration_items(&self, iterable: &Value) -> Result<(Vec<(Value, Value)>, bool), VmError> {
        let indexed = |items: Vec<Value>| -> Vec<(Value, Value)> {
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect()
        };
        match iterable {
            Value::Array(items) => Ok((indexed(items.read().clone()), false)),
            Value::Str(s) => Ok((indexed(s.chars().map(|c| Value::str(c.to_string())).collect()), false)),
            Value::Map(map) => Ok((
                map.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                true,
            )),
            Value::Collection(collection) => match &*collection.data.read() {
                CollectionData::Seq(items) => Ok((indexed(items.iter().cloned().collect()), false)),
                CollectionData::Map(map) => {
                    Ok((map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(), true))
                }
            },
            Value::Nil => Ok((Vec::new(), false)),
            other => Err(VmError::Type(format!("'{}' object is not iterable", type_name(other)))),
        }
    }

    fn iterate(
        &self,
        stmt: &ForInStatement,
        env: &Env,
        key: Value,
        item: Value,
        keyed: bool,
    ) -> ExecResult {
        let scope = env.child();
        match stmt.bindings.as_slice() {
            [single] => {
                let value = if keyed { key } else { item };
                scope.define(single.clone(), value, BindingKind::Var);
            }
            [first, second, ..] => {
                scope.define(first.clone(), key, BindingKind::Var);
                scope.define(second.clone(), item, BindingKind::Var);
            }
            [] => {}
        }
        if let Some(filter) = &stmt.filter {
            if !try_flow!(self.eval(filter, &scope)).is_truthy() {
                return Ok(Flow::Continue);
            }
        }
        self.exec_block(&stmt.body, &scope)
    }

    fn exec_loop(&self, stmt: &LoopStatement, env: &Env) -> ExecResult {
        loop {
            if let Some(condition) = &stmt.condition {
                if !try_flow!(self.eval(condition, env)).is_truthy() {
                    break;
                }
            }
            match self.exec_block(&stmt.body, &env.child())? {
                Flow::Break => break,
                Flow::Value(_) | Flow::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Value(Value::Nil))
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn exec_try(&self, stmt: &TryStatement, env: &Env) -> ExecResult {
        let mut outcome = self.exec_block(&stmt.body, &env.child()).map(discard_value);

        if let Ok(Flow::Thrown(exception)) = &outcome {
            let exception = exception.clone();
            for clause in &stmt.catches {
                let matches = match &clause.exception_type {
                    Some(ty) => instance_of(self.registry(), &exception.value, &canonicalize(ty)),
                    None => true,
                };
                if !matches {
                    continue;
                }
                let scope = env.child();
                if let Some(binding) = &clause.binding {
                    scope.define(binding.clone(), exception.value.clone(), BindingKind::Var);
                }
                outcome = self.exec_block(&clause.body, &scope).map(discard_value);
                break;
            }
        }

        match &stmt.finally {
            Some(finally) => match self.exec_block(finally, &env.child())? {
                Flow::Value(_) => outcome,
                overriding => Ok(overriding),
            },
            None => outcome,
        }
    }

    /// Run a frame's deferred calls, last registered first.
    ///
    /// A deferred call that throws replaces the frame's outcome.
    pub(crate) fn finish_frame(&self, env: &Env, outcome: ExecResult) -> ExecResult {
        let deferred = env.take_defers();
        if deferred.is_empty() {
            return outcome;
        }
        let mut outcome = outcome;
        for entry in deferred.into_iter().rev() {
            match self.run_deferred(&entry) {
                Ok(()) => {}
                Err(Signal::Throw(exception)) => {
                    if let Ok(Flow::Thrown(previous)) = &outcome {
                        tracing::warn!(
                            superseded = %previous.message(),
                            replacement = %exception.message(),
                            "deferred call threw while unwinding"
                        );
                    }
                    outcome = Ok(Flow::Thrown(exception));
                }
                Err(Signal::Fault(mut fault)) => {
                    fault.locate(entry.span);
                    outcome = Err(fault);
                }
            }
        }
        outcome
    }

    fn run_deferred(&self, entry: &Deferred) -> EvalResult<()> {
        let value = self.eval(&entry.call, &entry.env)?;
        // `defer cleanup` registers the function itself
        if !matches!(entry.call, Expression::Call(_)) && value.is_callable() {
            self.call_value(&value, Vec::new(), &[], entry.span)?;
        }
        Ok(())
    }

    // ========================================================================
    // select / switch
    // ========================================================================

    fn exec_select(&self, stmt: &SelectStatement, env: &Env) -> ExecResult {
        let mut arms = Vec::with_capacity(stmt.cases.len());
        for case in &stmt.cases {
            let (expression, receive) = match &case.kind {
                SelectCaseKind::Recv { channel, .. } => (channel, true),
                SelectCaseKind::Closed { channel } => (channel, false),
            };
            let channel = match try_flow!(self.eval(expression, env)) {
                Value::Channel(channel) => channel,
                other => return Err(VmError::type_mismatch("Channel", type_name(&other)).into()),
            };
            arms.push(if receive {
                SelectArm::Recv(channel)
            } else {
                SelectArm::Closed(channel)
            });
        }

        match select(&arms, self.options().select_policy) {
            Selected::Received { arm, value } => {
                let case = &stmt.cases[arm];
                let scope = env.child();
                if let SelectCaseKind::Recv {
                    binding: Some(name),
                    ..
                } = &case.kind
                {
                    scope.define(name.clone(), value, BindingKind::Let);
                }
                self.exec_block(&case.body, &scope).map(discard_value)
            }
            Selected::Closed { arm } => self
                .exec_block(&stmt.cases[arm].body, &env.child())
                .map(discard_value),
            Selected::Exhausted => Ok(Flow::Value(Value::Nil)),
        }
    }

    fn exec_switch(&self, stmt: &SwitchStatement, env: &Env) -> ExecResult {
        let subject = try_flow!(self.eval(&stmt.subject, env));
        for case in &stmt.cases {
            let scope = env.child();
            let matched = match &case.pattern {
                CasePattern::Values(values) => {
                    let mut hit = false;
                    for candidate in values {
                        if try_flow!(self.eval(candidate, env)).equals(&subject) {
                            hit = true;
                            break;
                        }
                    }
                    hit
                }
                CasePattern::Type { binding, ty } => {
                    if instance_of(self.registry(), &subject, &canonicalize(ty)) {
                        scope.define(binding.clone(), subject.clone(), BindingKind::Let);
                        true
                    } else {
                        false
                    }
                }
            };
            if matched {
                return self.exec_block(&case.body, &scope).map(discard_value);
            }
        }
        match &stmt.default {
            Some(block) => self.exec_block(block, &env.child()).map(discard_value),
            None => Ok(Flow::Value(Value::Nil)),
        }
    }
}
