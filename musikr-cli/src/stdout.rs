//! Colored terminal output helpers used by the `show` subcommand.

#[macro_export]
macro_rules! print_header {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stdout = StandardStream::stdout(ColorChoice::Auto);

        stdout.set_color(
            ColorSpec::new()
                .set_bold(true)
                .set_intense(true)
                .set_fg(Some(Color::Blue))
        ).unwrap();

        writeln![&mut stdout, $($arg)+].unwrap();

        stdout.reset().unwrap();
    }};
}

#[macro_export]
macro_rules! print_entry {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stdout = StandardStream::stdout(ColorChoice::Auto);

        stdout.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Green))
        ).unwrap();

        write![&mut stdout, $($arg)+].unwrap();

        stdout.reset().unwrap();
    }};
}

#[macro_export]
macro_rules! errorln {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stderr = StandardStream::stderr(ColorChoice::Auto);

        stderr.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Red))
                .set_bold(true)
        ).unwrap();

        write![&mut stderr, "error"].unwrap();
        stderr.reset().unwrap();
        write![&mut stderr, ": "].unwrap();
        writeln![&mut stderr, $($arg)+].unwrap();
    }};
}
