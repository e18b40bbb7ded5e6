use humandate::{MatchSummary, ParseResultVerbose};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(input: &str, res: &ParseResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    let details = &res.details;
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Parsing: \"{}\"", input), ansi::CYAN)));
    println!("  {} {}", palette.dim("normalized:"), palette.paint(format!("{:?}", details.normalized), ansi::YELLOW));

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if details.matches.is_empty() {
        println!("{}", palette.dim("  No rule matched, the reference is returned unchanged"));
        println!("\n{}", palette.dim("  Tip: set RUST_LOG=humandate=debug to follow rule matching"));
    } else {
        for m in &details.matches {
            println!("  {}", fmt_match(m, &palette));
        }
    }

    println!("\n{}", palette.paint("━━━ Delta ━━━", ansi::GRAY));
    if details.fields.is_empty() {
        println!("{}", palette.dim("  (empty)"));
    }
    for field in details.fields.iter().rev() {
        let value = if field.relative { format!("{:+}", field.value) } else { format!("= {}", field.value) };
        println!(
            "  {:<8} {} {}",
            palette.paint(field.kind.name(), ansi::BLUE),
            palette.bold(value),
            palette.dim(if field.relative { "relative" } else { "absolute" })
        );
    }

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    println!("  {}", palette.bold(palette.paint(res.value.format("%Y-%m-%d %H:%M:%S").to_string(), ansi::GREEN)));

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Matching: {} ({} rules)  │  Resolve: {}",
        palette.paint(format!("{:?}", details.total), ansi::GREEN),
        palette.paint(format!("{:?}", details.matching), ansi::CYAN),
        details.rules_considered,
        palette.dim(format!("{:?}", details.resolve)),
    );
    println!();
}

fn fmt_match(m: &MatchSummary, palette: &ansi::Palette) -> String {
    format!(
        "{} {} {} {} {}",
        palette.paint(format!("[{}]", m.rule), ansi::GRAY),
        palette.bold(palette.paint(&m.text, ansi::GREEN)),
        palette.dim("│"),
        palette.paint(&m.pattern, ansi::CYAN),
        palette.paint(m.period.as_deref().map(|p| format!("({p})")).unwrap_or_default(), ansi::BLUE),
    )
}
