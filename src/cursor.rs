//! Cursor de caracteres sobre una sentencia.
//!
//! El traductor no tiene una fase léxica separada. En su lugar, cada
//! regla gramatical consulta directamente el siguiente carácter de la
//! sentencia con [`Cursor::peek()`] y consume con [`Cursor::expect()`],
//! [`Cursor::name()`] o [`Cursor::number()`]. Tras todo consumo exitoso
//! se descartan los espacios en blanco que sigan, por lo cual `peek()`
//! siempre observa el inicio del siguiente token.
//!
//! El cursor nunca retrocede. Puede observar más allá del siguiente
//! carácter para clasificar una sentencia (palabra clave contra
//! identificador, asignación contra expresión), pero eso no consume.

use std::rc::Rc;

use crate::{
    error::{Compile, CompileError, Expected},
    source::{Located, Location, Position, Source},
};

/// Búfer de una sola sentencia y su posición de lectura.
pub struct Cursor {
    source: Rc<Source>,
    chars: Vec<char>,
    index: usize,
    position: Position,
}

impl Cursor {
    /// Crea un cursor al inicio de una sentencia, ya sin espacios iniciales.
    pub fn new(source: Rc<Source>) -> Self {
        let chars = source.text().chars().collect();
        let position = source.start();

        let mut cursor = Cursor {
            source,
            chars,
            index: 0,
            position,
        };

        cursor.skip_white();
        cursor
    }

    /// Obtiene la sentencia de origen.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Observa el siguiente carácter sin consumirlo.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Determina si el siguiente carácter es `c`, sin distinguir mayúsculas.
    pub fn is(&self, c: char) -> bool {
        matches!(self.peek(), Some(next) if next.eq_ignore_ascii_case(&c))
    }

    /// Determina si el siguiente carácter es `c` y constituye por sí solo una palabra.
    ///
    /// Las palabras clave y los literales booleanos son letras sueltas. Una
    /// letra que continúa en un identificador (`intermediate`) o que es
    /// destino de `=` (`i=1`, `i = 1`) no cuenta como palabra clave.
    pub fn standalone(&self, c: char) -> bool {
        let next = self.chars.get(self.index + 1).copied();
        self.is(c)
            && !matches!(next, Some(next) if next.is_ascii_alphanumeric())
            && self.next_token() != Some('=')
    }

    /// Determina si tras el carácter actual sigue, espacios aparte, un identificador.
    pub fn followed_by_name(&self) -> bool {
        matches!(self.next_token(), Some(c) if c.is_ascii_alphabetic())
    }

    /// Determina si la sentencia comienza con `nombre =`.
    pub fn at_assignment(&self) -> bool {
        let rest = &self.chars[self.index..];
        if !matches!(rest.first(), Some(c) if c.is_ascii_alphabetic()) {
            return false;
        }

        rest.iter()
            .skip_while(|c| c.is_ascii_alphanumeric())
            .find(|c| !is_white(**c))
            .map_or(false, |&c| c == '=')
    }

    /// Consume `c` o falla.
    pub fn expect(&mut self, c: char) -> Compile<()> {
        if self.is(c) {
            self.bump();
            self.skip_white();
            Ok(())
        } else {
            self.fail(CompileError::Expected(Expected::Char(c)))
        }
    }

    /// Consume un identificador y lo retorna en mayúsculas.
    pub fn name(&mut self) -> Compile<String> {
        if !matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            return self.fail(CompileError::Expected(Expected::Name));
        }

        let name = self.run_of(|c| c.is_ascii_alphanumeric());
        Ok(name.to_ascii_uppercase())
    }

    /// Consume una constante entera y retorna sus dígitos tal cual.
    pub fn number(&mut self) -> Compile<String> {
        if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            return self.fail(CompileError::Expected(Expected::Integer));
        }

        Ok(self.run_of(|c| c.is_ascii_digit()))
    }

    /// Verifica que la sentencia se haya consumido por completo.
    pub fn finish(&self) -> Compile<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) => self.fail(CompileError::Trailing(c)),
        }
    }

    /// Indica si ya no quedan caracteres.
    pub fn at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// Construye un error en la posición actual.
    pub fn error(&self, error: CompileError) -> Located<CompileError> {
        Located::at(error, Location::at(Rc::clone(&self.source), self.position))
    }

    /// Falla en la posición actual.
    pub fn fail<T>(&self, error: CompileError) -> Compile<T> {
        Err(self.error(error))
    }

    /// Primer carácter no blanco después del actual.
    fn next_token(&self) -> Option<char> {
        self.chars
            .iter()
            .skip(self.index + 1)
            .copied()
            .find(|&c| !is_white(c))
    }

    fn run_of<F>(&mut self, accept: F) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut run = String::new();
        while let Some(c) = self.peek().filter(|&c| accept(c)) {
            run.push(c);
            self.bump();
        }

        self.skip_white();
        run
    }

    fn skip_white(&mut self) {
        while matches!(self.peek(), Some(c) if is_white(c)) {
            self.bump();
        }
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.index += 1;
            self.position = match c {
                '\t' => self.position.tab(),
                _ => self.position.advance(),
            };
        }
    }
}

fn is_white(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
