//! Expresiones aritméticas.
//!
//! ```text
//! expression := [ '+' | '-' ] term { addop term }
//! term       := factor { mulop factor }
//! factor     := '(' expression ')' | ident | number
//! ident      := name [ '(' ')' ]
//! ```
//!
//! Todo operador binario apila el operando izquierdo, evalúa el
//! derecho en el acumulador y luego los combina. El resultado queda
//! en el acumulador y la pila vuelve a la profundidad original.

use super::Parser;
use crate::{
    error::Compile,
    target::{BinOp, Emitter},
};

impl<E: Emitter> Parser<'_, E> {
    pub(super) fn expression(&mut self) -> Compile<()> {
        self.nested(|s| {
            // Un signo inicial opera contra cero: `-2` es `0 - 2`
            if s.at_addop() {
                s.emit(|t| t.clear())?;
            } else {
                s.term()?;
            }

            while let Some(op) = s.addop() {
                s.binary(op, Parser::term)?;
            }

            Ok(())
        })
    }

    fn term(&mut self) -> Compile<()> {
        self.factor()?;
        while let Some(op) = self.mulop() {
            self.binary(op, Parser::factor)?;
        }

        Ok(())
    }

    fn factor(&mut self) -> Compile<()> {
        match self.cursor.peek() {
            Some('(') => {
                self.cursor.expect('(')?;
                self.expression()?;
                self.cursor.expect(')')
            }

            Some(c) if c.is_ascii_alphabetic() => self.ident(),

            _ => {
                let digits = self.cursor.number()?;
                self.emit(|t| t.load_const(&digits))
            }
        }
    }

    fn ident(&mut self) -> Compile<()> {
        let name = self.cursor.name()?;

        if self.cursor.is('(') {
            self.cursor.expect('(')?;
            self.cursor.expect(')')?;

            self.emit(|t| t.call(&name))?;
            self.compiler.stubs.insert(name);

            Ok(())
        } else {
            self.emit(|t| t.load_var(&name))
        }
    }

    /// Apila el acumulador, consume el operador, traduce el operando derecho y combina.
    pub(super) fn binary<F>(&mut self, op: BinOp, right: F) -> Compile<()>
    where
        F: FnOnce(&mut Self) -> Compile<()>,
    {
        self.emit(|t| t.push())?;
        self.cursor.expect(operator_char(op))?;

        right(self)?;
        self.emit(|t| t.combine(op))
    }

    fn at_addop(&self) -> bool {
        self.addop().is_some()
    }

    fn addop(&self) -> Option<BinOp> {
        match self.cursor.peek()? {
            '+' => Some(BinOp::Add),
            '-' => Some(BinOp::Sub),
            _ => None,
        }
    }

    fn mulop(&self) -> Option<BinOp> {
        match self.cursor.peek()? {
            '*' => Some(BinOp::Mul),
            '/' => Some(BinOp::Div),
            _ => None,
        }
    }
}

/// Carácter fuente de cada operador binario.
pub(super) fn operator_char(op: BinOp) -> char {
    match op {
        BinOp::Add => '+',
        BinOp::Sub => '-',
        BinOp::Mul => '*',
        BinOp::Div => '/',
        BinOp::And => '&',
        BinOp::Or => '|',
        BinOp::Xor => '~',
    }
}
