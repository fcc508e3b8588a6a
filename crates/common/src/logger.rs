use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

pub fn setup_logger(level: &str) -> Result<(), ParseError> {
    let filter = EnvFilter::builder()
        .parse(level)?
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?);

    tracing_subscriber::fmt()
        // .with_file(true)
        // .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .init();

    Ok(())
}
