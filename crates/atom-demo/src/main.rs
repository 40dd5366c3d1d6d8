//! Example plugin
//!
//! Reads `input_demo`, fails the step with a user error when it is missing,
//! and otherwise publishes a single string output named `output_demo`.

use atom_sdk::{
    error_code,
    AtomContext,
    AtomFailure,
    AtomOutcome,
    AtomSuccess,
    OutputField,
    EXIT_FATAL,
};

fn run(ctx: &AtomContext) -> AtomOutcome {
    tracing::info!("enter main");

    let input_demo = ctx.input().get_string("input_demo");
    tracing::info!("input_demo is {:?}", input_demo);

    let Some(input_demo) = input_demo else {
        return Err(AtomFailure::user(
            error_code::USER_CONFIG_ERROR,
            "input_demo is None",
        ));
    };

    tracing::info!("Hello world! ({input_demo})");

    Ok(AtomSuccess::new().with_field("output_demo", OutputField::string("test output")))
}

fn main() {
    atom_sdk::logging::init();

    let ctx = match AtomContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to initialise plugin context: {e}");
            std::process::exit(EXIT_FATAL);
        }
    };

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(&ctx)))
        .unwrap_or_else(|_| {
            Err(AtomFailure::plugin(
                error_code::PLUGIN_ERROR,
                "plugin panicked",
            ))
        });
    std::process::exit(ctx.finish(outcome));
}
