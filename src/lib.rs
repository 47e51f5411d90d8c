//! Traductor de una sola pasada hacia una máquina de pila en C++.
//!
//! # Lenguaje fuente
//! El lenguaje de entrada es diminuto: expresiones aritméticas
//! enteras, expresiones booleanas y relacionales, asignaciones, y
//! estructuras de control cuyas palabras clave son letras sueltas
//! (`i`, `l`, `e`, `w`, `p`, `r`, `u`, `f`, `d`, `b`). Cada línea de
//! entrada es una sentencia completa.
//!
//! # Traducción
//! No hay fase léxica ni árbol sintáctico. El [`cursor`] expone el
//! siguiente carácter de la sentencia y las reglas de descenso
//! recursivo en [`compile`] emiten código en el mismo instante en que
//! reconocen cada construcción, a través de las primitivas de
//! [`target::Emitter`]. El código emitido siempre deja el último valor
//! calculado en el acumulador (`registers[0]`) y toda construcción deja
//! la pila con la misma profundidad que encontró.
//!
//! # Programa emitido
//! En modo programa, [`compile::Compiler::translate_program()`] rodea a
//! las sentencias traducidas con el esqueleto de una clase C++ con pila,
//! registros, tabla de variables y un método `dump()`. Los módulos
//! [`fixture`] y [`link`] construyen sobre eso casos de prueba para
//! googletest y ejecutables nativos.

#[macro_use]
mod macros;

pub mod compile;
pub mod cursor;
pub mod error;
pub mod fixture;
pub mod link;
pub mod source;
pub mod target;

pub use compile::{Compiler, Options};
pub use error::{Compile, CompileError, Diagnostics};
