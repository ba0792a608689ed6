//! `polyloft eval`: evaluate inline source

use polyloft_engine::{EvalOptions, Runtime};

pub fn execute(code: &str, options: EvalOptions) -> anyhow::Result<()> {
    let runtime = Runtime::new(options);
    let value = runtime.eval_source(code)?;
    if !value.is_nil() {
        println!("{}", value);
    }
    Ok(())
}
