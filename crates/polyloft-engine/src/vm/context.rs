//! Evaluation context: options, output sinks and the `Runtime`
//!
//! A `Runtime` owns everything that used to be process-wide: the type
//! registry, the builtin globals and the session scope. Independent
//! runtimes never observe each other's declarations.

use crate::parser::ast::Program;
use crate::parser::Parser;
use crate::vm::builtins;
use crate::vm::env::{Env, Environment};
use crate::vm::error::EvalError;
use crate::vm::interpreter::Interpreter;
use crate::vm::types::TypeRegistry;
use crate::vm::value::Value;
use crate::vm::VmError;
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Output
// ============================================================================

/// Destination of `print`/`println`.
pub trait OutputSink: Send + Sync {
    fn write_str(&self, text: &str);
}

/// Writes to the process's stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_str(&self, text: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(text.as_bytes());
        let _ = lock.flush();
    }
}

/// Captures output in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Mutex<String>,
}

impl BufferSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl OutputSink for BufferSink {
    fn write_str(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }
}

// ============================================================================
// Options
// ============================================================================

/// Which ready case a `select` fires when several are ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectPolicy {
    /// First ready case in declaration order
    #[default]
    FirstReady,
    /// Uniformly random among ready cases
    Random,
}

/// Evaluation options.
#[derive(Clone)]
pub struct EvalOptions {
    pub stdout: Arc<dyn OutputSink>,
    /// Maximum nesting of user calls
    pub max_call_depth: usize,
    pub select_policy: SelectPolicy,
    /// Stack size of the evaluation thread and of spawned threads
    pub thread_stack_size: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            stdout: Arc::new(StdoutSink),
            max_call_depth: 512,
            select_policy: SelectPolicy::FirstReady,
            thread_stack_size: 32 * 1024 * 1024,
        }
    }
}

impl EvalOptions {
    pub fn with_stdout(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.stdout = sink;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_select_policy(mut self, policy: SelectPolicy) -> Self {
        self.select_policy = policy;
        self
    }

    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }
}

impl std::fmt::Debug for EvalOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalOptions")
            .field("max_call_depth", &self.max_call_depth)
            .field("select_policy", &self.select_policy)
            .field("thread_stack_size", &self.thread_stack_size)
            .finish()
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// State shared by every thread evaluating on behalf of one `Runtime`.
pub struct RuntimeState {
    pub registry: TypeRegistry,
    pub options: EvalOptions,
    globals: RwLock<Env>,
}

impl RuntimeState {
    /// Scope holding builtins and the exception prelude.
    pub fn globals(&self) -> Env {
        self.globals.read().clone()
    }

    pub fn write_output(&self, text: &str) {
        self.options.stdout.write_str(text);
    }
}

/// An isolated Polyloft runtime.
pub struct Runtime {
    state: Arc<RuntimeState>,
    /// Top-level scope shared by successive evaluations (the REPL session)
    session: RwLock<Env>,
}

impl Runtime {
    pub fn new(options: EvalOptions) -> Self {
        let globals = Environment::root();
        let state = Arc::new(RuntimeState {
            registry: TypeRegistry::new(),
            options,
            globals: RwLock::new(globals.clone()),
        });
        install_builtins(&state, &globals);
        let session = globals.frame("<main>", None);
        Self {
            state,
            session: RwLock::new(session),
        }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.state.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.state.registry
    }

    /// Current value of a top-level binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.session.read().lookup(name)
    }

    /// Clear every declaration and binding, then reinstall the builtins.
    pub fn reset(&self) {
        self.state.registry.clear();
        let globals = Environment::root();
        *self.state.globals.write() = globals.clone();
        install_builtins(&self.state, &globals);
        *self.session.write() = globals.frame("<main>", None);
        tracing::debug!("runtime reset");
    }

    /// Evaluate a program in the session scope.
    ///
    /// Runs on a dedicated thread so deep recursion gets the configured
    /// stack size regardless of the caller's.
    pub fn eval_program(&self, program: &Program) -> Result<Value, EvalError> {
        let env = self.session.read().clone();
        let state = Arc::clone(&self.state);
        let stack_size = self.state.options.thread_stack_size;
        std::thread::scope(|scope| {
            let handle = std::thread::Builder::new()
                .name("polyloft-eval".to_string())
                .stack_size(stack_size)
                .spawn_scoped(scope, move || Interpreter::new(state).run_program(program, &env))
                .map_err(|e| runtime_error(format!("failed to start evaluation: {}", e)))?;
            handle
                .join()
                .map_err(|_| runtime_error("evaluation thread panicked".to_string()))?
        })
    }

    pub fn eval_source(&self, source: &str) -> Result<Value, EvalError> {
        let program = parse_program(source)?;
        self.eval_program(&program)
    }

    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<Value, EvalError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.eval_source(&source)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(EvalOptions::default())
    }
}

fn install_builtins(state: &Arc<RuntimeState>, globals: &Env) {
    if let Err(e) = builtins::install(state, globals) {
        tracing::error!(error = %e, "failed to install builtins");
    }
}

fn runtime_error(message: String) -> EvalError {
    EvalError::Runtime {
        error: VmError::Runtime(message),
        span: None,
        trace: Vec::new(),
    }
}

/// Tokenize and parse `source`.
pub fn parse_program(source: &str) -> Result<Program, EvalError> {
    Parser::new(source)
        .map_err(EvalError::Lex)?
        .parse()
        .map_err(EvalError::Parse)
}

/// Evaluate `program` in a fresh runtime.
pub fn eval(program: &Program, options: EvalOptions) -> Result<Value, EvalError> {
    Runtime::new(options).eval_program(program)
}

/// Parse and evaluate `source` in a fresh runtime.
pub fn eval_source(source: &str, options: EvalOptions) -> Result<Value, EvalError> {
    Runtime::new(options).eval_source(source)
}
