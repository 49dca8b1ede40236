use scopecraft::{Applied, ApplyDetails, CallLog, Decision, RequestContext, ScopeError, StaticContext, ValueSource};

/// Terminal styles by role.
#[derive(Clone, Copy)]
enum Style {
    Heading,
    Scope,
    Method,
    Applied,
    Resolve,
    Skipped,
    Failure,
    Action,
    Muted,
}

impl Style {
    fn sgr(self) -> &'static str {
        match self {
            Style::Heading => "90",
            Style::Scope => "34",
            Style::Method => "1;32",
            Style::Applied => "32",
            Style::Resolve => "36",
            Style::Skipped => "33",
            Style::Failure => "1;31",
            Style::Action => "1;36",
            Style::Muted => "2",
        }
    }
}

struct Palette {
    color: bool,
}

impl Palette {
    fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: impl AsRef<str>, style: Style) -> String {
        let text = text.as_ref();
        if self.color { format!("\x1b[{}m{text}\x1b[0m", style.sgr()) } else { text.to_string() }
    }
}

pub fn print_run(ctx: &StaticContext, applied: &Applied<CallLog>, details: &ApplyDetails, color: bool) {
    let palette = Palette::new(color);
    print_header(ctx, &palette);

    println!("\n{}", palette.paint("━━━ Scopes ━━━", Style::Heading));
    for trace in &details.traces {
        let label =
            if trace.key == trace.scope { trace.scope.clone() } else { format!("{} (as {})", trace.scope, trace.key) };
        println!("  {:<32} {}", palette.paint(label, Style::Scope), fmt_decision(trace.decision, &palette));
    }

    println!("\n{}", palette.paint("━━━ Calls ━━━", Style::Heading));
    if applied.collection.is_empty() {
        println!("{}", palette.paint("  No scopes applied", Style::Muted));
    }
    for (idx, call) in applied.collection.calls().iter().enumerate() {
        let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
        println!(
            "  {} {}({})",
            palette.paint(format!("[{}]", idx), Style::Heading),
            palette.paint(&call.method, Style::Method),
            args.join(", ")
        );
    }

    println!("\n{}", palette.paint("━━━ Current scopes ━━━", Style::Heading));
    println!("  {}", applied.current_scopes.to_json());

    let metrics = &applied.metrics;
    println!("\n{}", palette.paint("━━━ Timing ━━━", Style::Heading));
    println!(
        "  Total: {}  │  Resolve: {}  │  Apply: {}",
        palette.paint(format!("{:?}", metrics.total), Style::Applied),
        palette.paint(format!("{:?}", metrics.resolve), Style::Resolve),
        palette.paint(format!("{:?}", metrics.apply), Style::Muted),
    );
    println!(
        "  {}",
        palette.paint(
            format!(
                "params {}/{}  defaults {}/{}{}",
                metrics.params.resolved,
                metrics.params.considered,
                metrics.defaults.resolved,
                metrics.defaults.considered,
                metrics.fallback.map(|p| format!("  fallback {}/{}", p.resolved, p.considered)).unwrap_or_default(),
            ),
            Style::Muted,
        )
    );
    println!();
}

pub fn print_error(ctx: &StaticContext, err: &ScopeError, color: bool) {
    let palette = Palette::new(color);
    print_header(ctx, &palette);

    println!("\n{}", palette.paint("━━━ Failed ━━━", Style::Heading));
    println!("  {} {}", palette.paint(err.code(), Style::Failure), err);
    if err.is_input_error() {
        println!("  {}", palette.paint("The request parameters do not match the declared scope types.", Style::Muted));
    }
    println!();
}

fn print_header(ctx: &StaticContext, palette: &Palette) {
    println!("\n{}", palette.paint(format!("⚙  Action: \"{}\"", ctx.action()), Style::Action));
    println!("  {}", palette.paint(serde_json::Value::Object(ctx.params.clone()).to_string(), Style::Muted));
}

fn fmt_decision(decision: Decision, palette: &Palette) -> String {
    match decision {
        Decision::Applied(ValueSource::Param) => palette.paint("✓ applied from params", Style::Applied),
        Decision::Applied(ValueSource::Default) => palette.paint("✓ applied from default", Style::Applied),
        Decision::Applied(ValueSource::Fallback) => palette.paint("✓ applied from fallback", Style::Applied),
        Decision::Suppressed => palette.paint("– default suppressed", Style::Skipped),
        Decision::BooleanFalse => palette.paint("– false", Style::Skipped),
        Decision::Absent => palette.paint("✗ no value", Style::Muted),
        Decision::GuardRejected => palette.paint("✗ guard rejected", Style::Muted),
        Decision::ExcludedByAction => palette.paint("✗ not for this action", Style::Muted),
    }
}
