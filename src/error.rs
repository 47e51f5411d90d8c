//! Errores de traducción y su presentación.
//!
//! Toda falla del traductor es fatal para la sentencia en curso. Los
//! errores se clasifican en sintácticos, semánticos y de consistencia
//! interna, pero todos viajan por el mismo canal: un
//! [`Located<CompileError>`] retornado con `Result`. El reporte para
//! humanos se construye con [`Diagnostics`] y los drivers lo escriben
//! al flujo de errores, nunca a la salida de código.

use crate::source::Located;
use std::{
    fmt::{self, Display},
    io,
};

use thiserror::Error;

/// Construcción que se esperaba encontrar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Un carácter específico.
    Char(char),

    /// Un identificador.
    Name,

    /// Una constante entera.
    Integer,

    /// El inicio de una sentencia.
    Statement,
}

impl Display for Expected {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Char(c) => write!(fmt, "`{}`", c),
            Expected::Name => fmt.write_str("Name"),
            Expected::Integer => fmt.write_str("Integer"),
            Expected::Statement => fmt.write_str("statement"),
        }
    }
}

/// Error de traducción.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CompileError {
    /// Error de E/S al escribir código emitido.
    #[error("I/O error")]
    Io(#[from] io::Error),

    /// Se esperaba una construcción específica en esta posición.
    #[error("Expected {0}")]
    Expected(Expected),

    /// Se encontró `b` fuera de todo ciclo.
    #[error("No loop to break from")]
    NoLoop,

    /// La gramática terminó sin consumir toda la sentencia.
    #[error("Unexpected trailing input {0:?}")]
    Trailing(char),

    /// Se excedió el límite de anidamiento.
    #[error("Nesting too deep, limit is {0} levels")]
    TooDeep(usize),

    /// El nombre del programa no puede usarse como nombre de clase.
    #[error("Invalid program name `{0}`")]
    BadProgramName(String),
}

/// Clasificación gruesa de un [`CompileError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Consistency,
    Io,
}

impl CompileError {
    /// Determina la clase de error.
    pub fn kind(&self) -> ErrorKind {
        use CompileError::*;

        match self {
            Io(_) => ErrorKind::Io,
            Expected(_) | TooDeep(_) | BadProgramName(_) => ErrorKind::Syntax,
            NoLoop => ErrorKind::Semantic,
            Trailing(_) => ErrorKind::Consistency,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Consistency => "internal error",
            ErrorKind::Io => "error",
        };

        fmt.write_str(string)
    }
}

/// Resultado de una regla de traducción.
pub type Compile<T> = Result<T, Located<CompileError>>;

/// Reporte legible de uno o más errores de traducción.
#[derive(Default)]
pub struct Diagnostics {
    errors: Vec<Located<CompileError>>,
}

impl Diagnostics {
    /// Agrega un error al reporte.
    pub fn push(&mut self, error: Located<CompileError>) {
        self.errors.push(error);
    }

    /// Indica si no se ha reportado ningún error.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<Located<CompileError>> for Diagnostics {
    fn from(error: Located<CompileError>) -> Self {
        Diagnostics {
            errors: vec![error],
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", error.val().kind(), error.val())?;

            let location = error.location();
            writeln!(fmt, " --> {}", location)?;

            let line_number = location.start().line();
            let digits = line_number.to_string().chars().count();

            writeln!(fmt, "{:digits$} |", "", digits = digits)?;
            writeln!(
                fmt,
                "{:>digits$} | {}",
                line_number,
                location.source().text(),
                digits = digits
            )?;

            let (from, to) = (location.start().column(), location.end().column() - 1);
            let min = from.min(to);
            let max = from.max(to);

            let skip = (min - 1) as usize;
            let highlight = (max - min + 1) as usize;

            writeln!(
                fmt,
                "{:digits$} | {:skip$}{:^<highlight$}",
                "",
                "",
                "",
                digits = digits,
                skip = skip,
                highlight = highlight
            )?;

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Translation failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Location, Source};
    use std::rc::Rc;

    #[test]
    fn kinds() {
        assert_eq!(CompileError::NoLoop.kind(), ErrorKind::Semantic);
        assert_eq!(CompileError::Trailing(')').kind(), ErrorKind::Consistency);
        assert_eq!(
            CompileError::Expected(Expected::Name).kind(),
            ErrorKind::Syntax
        );
    }

    #[test]
    fn messages() {
        let error = CompileError::Expected(Expected::Char(')'));
        assert_eq!(error.to_string(), "Expected `)`");
        assert_eq!(
            CompileError::Expected(Expected::Integer).to_string(),
            "Expected Integer"
        );
    }

    #[test]
    fn underlines_offending_column() {
        let source = Source::new("<stdin>", 1, "x=(1+2");
        let position = source.start().advance().advance().advance().advance().advance().advance();
        let error = Located::at(
            CompileError::Expected(Expected::Char(')')),
            Location::at(source, position),
        );

        let report = Diagnostics::from(error).to_string();
        insta::assert_snapshot!(report, @r###"
        syntax error: Expected `)`
         --> <stdin>:1:7
          |
        1 | x=(1+2
          |       ^

        Translation failed with 1 error
        "###);
    }

    #[test]
    fn collects_several_errors() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());

        for (name, error) in [("First", CompileError::NoLoop), ("Second", CompileError::Trailing(')'))] {
            let source = Source::new(name, 2, "b");
            diagnostics.push(Located::at(error, Location::at(Rc::clone(&source), source.start())));
        }

        assert!(!diagnostics.is_empty());

        let report = diagnostics.to_string();
        assert!(report.contains("semantic error: No loop to break from\n --> First:2:1\n"));
        assert!(report.contains("internal error: Unexpected trailing input ')'\n --> Second:2:1\n"));
        assert!(report.ends_with("Translation failed with 2 errors\n"));
    }
}
