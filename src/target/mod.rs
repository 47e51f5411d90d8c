//! Emisión de código.
//!
//! Las reglas gramaticales no escriben texto directamente, sino que
//! invocan primitivas de una máquina de pila con acumulador a través
//! del trait [`Emitter`]. Cada primitiva corresponde a una o pocas
//! líneas completas en la notación objetivo, las cuales se escriben
//! en el instante en que se invocan.

use std::{
    fmt::{self, Display},
    io,
};

mod cpp;

pub use cpp::Cpp;

/// Destino de un salto.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Label(number) = self;
        write!(fmt, "L{}", number)
    }
}

/// Operador binario que combina el tope de la pila con el acumulador.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
}

/// Operador relacional.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    Greater,
}

/// Prueba que fija la bandera de condición sin consumir la pila.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Test {
    /// El acumulador supera al tope de la pila.
    AboveTop,

    /// El acumulador es menor o igual a cero.
    NonPositive,
}

/// Emisión de código para la máquina de pila.
///
/// El estado de la máquina emitida consiste en un acumulador, una pila
/// de enteros, una tabla de variables y una bandera de condición. Las
/// primitivas describen transiciones de ese estado; los tipos que
/// implementan este trait deciden cómo representarlas.
pub trait Emitter {
    /// Emite el esqueleto previo al cuerpo traducido.
    fn begin_program(&mut self, name: &str, registers: usize) -> io::Result<()>;

    /// Cierra el esqueleto, declarando las funciones invocadas.
    fn end_program(&mut self, stubs: &[String]) -> io::Result<()>;

    /// Emite un punto de entrada que ejecuta el programa y vuelca su estado.
    fn entry_point(&mut self, name: &str) -> io::Result<()>;

    /// Acumulador en cero.
    fn clear(&mut self) -> io::Result<()>;

    /// Carga una constante entera, sin evaluar sus dígitos.
    fn load_const(&mut self, digits: &str) -> io::Result<()>;

    /// Carga un literal booleano como 0 o 1.
    fn load_bool(&mut self, value: bool) -> io::Result<()>;

    /// Carga el valor de una variable.
    fn load_var(&mut self, name: &str) -> io::Result<()>;

    /// Guarda el acumulador en una variable.
    fn store_var(&mut self, name: &str) -> io::Result<()>;

    /// Invoca una función sin argumentos y deja su resultado en el acumulador.
    fn call(&mut self, name: &str) -> io::Result<()>;

    /// Apila el acumulador.
    fn push(&mut self) -> io::Result<()>;

    /// Desapila hacia el acumulador.
    fn pop(&mut self) -> io::Result<()>;

    /// Descarta el tope de la pila.
    fn discard(&mut self) -> io::Result<()>;

    /// `acumulador = tope <op> acumulador`, luego desapila.
    fn combine(&mut self, op: BinOp) -> io::Result<()>;

    /// `condición = tope <rel> acumulador`, desapila y copia la condición al acumulador.
    fn compare(&mut self, relation: Relation) -> io::Result<()>;

    /// Negación lógica del acumulador.
    fn not(&mut self) -> io::Result<()>;

    /// Suma una constante pequeña al acumulador.
    fn step(&mut self, delta: i32) -> io::Result<()>;

    /// Fija la bandera de condición.
    fn test(&mut self, test: Test) -> io::Result<()>;

    /// Define una etiqueta en la posición actual.
    fn label(&mut self, label: Label) -> io::Result<()>;

    /// Salto incondicional.
    fn jump(&mut self, label: Label) -> io::Result<()>;

    /// Salta si el acumulador es cero.
    fn jump_if_false(&mut self, label: Label) -> io::Result<()>;

    /// Salta si la bandera de condición está activa.
    fn jump_if_condition(&mut self, label: Label) -> io::Result<()>;
}
