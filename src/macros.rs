macro_rules! emit {
    ($context:expr, $($format:tt)*) => {{
        $context.indent()?;
        writeln!($context.output(), $($format)*)
    }};
}
