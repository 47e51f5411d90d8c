//! Traducción en una sola pasada.
//!
//! Un [`Compiler`] representa una sesión de traducción completa: posee
//! al emisor, al contador de etiquetas y al registro de funciones
//! invocadas. Cada sentencia se traduce con un [`Parser`] efímero que
//! toma prestada la sesión y un [`Cursor`] propio. Las reglas
//! gramaticales emiten código en cuanto reconocen cada construcción,
//! por lo que no existe un árbol sintáctico intermedio.
//!
//! Las reglas están repartidas en [`expr`] (aritmética), [`boolean`]
//! (lógica y relaciones) y [`control`] (sentencias y bloques).

use std::{collections::BTreeSet, io, rc::Rc};

use crate::{
    cursor::Cursor,
    error::{Compile, CompileError, Expected},
    source::{Located, Location, Source},
    target::{Emitter, Label},
};

mod boolean;
mod control;
mod expr;

/// Nombre de origen para sentencias sueltas.
const INCREMENTAL_ORIGIN: &str = "<input>";

/// Parámetros de una sesión de traducción.
#[derive(Copy, Clone, Debug)]
pub struct Options {
    /// Tamaño del arreglo de registros del programa emitido.
    pub registers: usize,

    /// Profundidad máxima de anidamiento de paréntesis, negaciones y bloques.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            registers: 8,
            max_depth: 128,
        }
    }
}

/// Sesión de traducción.
pub struct Compiler<E> {
    target: E,
    options: Options,
    labels: u32,
    stubs: BTreeSet<String>,
    statements: u32,
}

impl<E: Emitter> Compiler<E> {
    /// Crea una sesión con opciones por defecto.
    pub fn new(target: E) -> Self {
        Compiler::with_options(target, Options::default())
    }

    /// Crea una sesión.
    pub fn with_options(target: E, options: Options) -> Self {
        Compiler {
            target,
            options,
            labels: 0,
            stubs: BTreeSet::new(),
            statements: 0,
        }
    }

    /// Obtiene el emisor.
    pub fn target(&self) -> &E {
        &self.target
    }

    /// Termina la sesión y toma ownership del emisor.
    pub fn into_target(self) -> E {
        self.target
    }

    /// Traduce una sola sentencia, sin esqueleto de programa.
    pub fn translate_statement(&mut self, line: &str) -> Compile<()> {
        self.statements += 1;
        let source = Source::new(INCREMENTAL_ORIGIN, self.statements, line);

        self.translate(Cursor::new(source))
    }

    /// Traduce un programa completo como una clase llamada `name`.
    ///
    /// Las etiquetas y las funciones invocadas son únicas a lo largo de
    /// todo el programa. Si una sentencia falla, el texto ya emitido
    /// permanece en la salida y la traducción se aborta.
    pub fn translate_program<I, S>(&mut self, lines: I, name: &str) -> Compile<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_program_name(name)?;
        tracing::debug!(program = name, "translating program");

        let registers = self.options.registers;
        self.emit_at(name, |target| target.begin_program(name, registers))?;

        for (index, line) in lines.into_iter().enumerate() {
            let source = Source::new(name, index as u32 + 1, line.as_ref());
            self.translate(Cursor::new(source))?;
        }

        let stubs: Vec<_> = self.stubs.iter().cloned().collect();
        self.emit_at(name, |target| target.end_program(&stubs))
    }

    /// Agrega un punto de entrada que ejecuta y vuelca a la clase `name`.
    pub fn entry_point(&mut self, name: &str) -> Compile<()> {
        check_program_name(name)?;
        self.emit_at(name, |target| target.entry_point(name))
    }

    fn translate(&mut self, cursor: Cursor) -> Compile<()> {
        let mut parser = Parser {
            cursor,
            compiler: self,
            depth: 0,
        };

        parser.top_level()
    }

    fn new_label(&mut self) -> Label {
        let label = Label(self.labels);
        self.labels += 1;

        tracing::trace!(%label, "allocated label");
        label
    }

    fn emit_at<F>(&mut self, name: &str, emit: F) -> Compile<()>
    where
        F: FnOnce(&mut E) -> io::Result<()>,
    {
        emit(&mut self.target).map_err(|error| {
            let source = Source::new(name, 1, name);
            let location = Location::at(Rc::clone(&source), source.start());

            Located::at(CompileError::Io(error), location)
        })
    }
}

/// Traducción de una sola sentencia.
struct Parser<'a, E> {
    cursor: Cursor,
    compiler: &'a mut Compiler<E>,
    depth: usize,
}

impl<E: Emitter> Parser<'_, E> {
    fn top_level(&mut self) -> Compile<()> {
        if self.cursor.at_end() {
            return Ok(());
        }

        if self.at_block_end() {
            return self.cursor.fail(CompileError::Expected(Expected::Statement));
        }

        tracing::debug!(statement = self.cursor.source().text(), "translating statement");

        self.statement(None)?;
        self.cursor.finish()
    }

    /// Aplica una primitiva del emisor, ubicando errores de E/S en la posición actual.
    fn emit<F>(&mut self, emit: F) -> Compile<()>
    where
        F: FnOnce(&mut E) -> io::Result<()>,
    {
        let result = emit(&mut self.compiler.target);
        result.map_err(|error| self.cursor.error(CompileError::Io(error)))
    }

    fn new_label(&mut self) -> Label {
        self.compiler.new_label()
    }

    /// Ejecuta una regla recursiva un nivel más adentro.
    fn nested<T, F>(&mut self, rule: F) -> Compile<T>
    where
        F: FnOnce(&mut Self) -> Compile<T>,
    {
        let limit = self.compiler.options.max_depth;
        if self.depth >= limit {
            return self.cursor.fail(CompileError::TooDeep(limit));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;

        result
    }
}

/// Un nombre de programa debe poder usarse como nombre de clase.
fn check_program_name(name: &str) -> Compile<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        let source = Source::new("<program name>", 1, name);
        let location = Location::at(Rc::clone(&source), source.start());

        Err(Located::at(
            CompileError::BadProgramName(name.to_string()),
            location,
        ))
    }
}
