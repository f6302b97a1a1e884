use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogStyle {
    // Long-running population and longevity runs: timestamps plus source locations, so that a
    // failure an hour into a run can be lined up against cluster events
    Run,

    // One-shot commands (cleanup, health) just print compact lines
    Cli,
}

pub fn setup(env_filter: &str, style: LogStyle) {
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(env_filter);
    match style {
        LogStyle::Run => builder
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::NEW)
            .compact()
            .init(),
        LogStyle::Cli => builder.without_time().compact().init(),
    }
}
