//! Expresiones booleanas y relacionales.
//!
//! ```text
//! booleanExpression := booleanTerm { ('|' | '~') booleanTerm }
//! booleanTerm       := notFactor { '&' notFactor }
//! notFactor         := '!' notFactor | booleanFactor
//! booleanFactor     := 'T' | 'F' | relation
//! relation          := expression [ relop expression ]
//! ```
//!
//! Los valores booleanos son 0 o 1 en el acumulador. Por eso `&`, `|`
//! y `~` (xor) se emiten como operadores de bits. Una relación sin
//! operador relacional es simplemente un valor aritmético.

use super::Parser;
use crate::{
    error::Compile,
    target::{BinOp, Emitter, Relation},
};

impl<E: Emitter> Parser<'_, E> {
    pub(super) fn boolean_expression(&mut self) -> Compile<()> {
        self.boolean_term()?;

        loop {
            let op = match self.cursor.peek() {
                Some('|') => BinOp::Or,
                Some('~') => BinOp::Xor,
                _ => break Ok(()),
            };

            self.binary(op, Parser::boolean_term)?;
        }
    }

    fn boolean_term(&mut self) -> Compile<()> {
        self.not_factor()?;
        while self.cursor.is('&') {
            self.binary(BinOp::And, Parser::not_factor)?;
        }

        Ok(())
    }

    fn not_factor(&mut self) -> Compile<()> {
        if self.cursor.is('!') {
            self.cursor.expect('!')?;
            self.nested(Parser::not_factor)?;
            self.emit(|t| t.not())
        } else {
            self.boolean_factor()
        }
    }

    fn boolean_factor(&mut self) -> Compile<()> {
        for (letter, value) in [('t', true), ('f', false)] {
            if self.cursor.standalone(letter) {
                self.cursor.expect(letter)?;
                return self.emit(|t| t.load_bool(value));
            }
        }

        self.relation()
    }

    fn relation(&mut self) -> Compile<()> {
        self.expression()?;

        let (symbol, relation) = match self.cursor.peek() {
            Some('=') => ('=', Relation::Equal),
            Some('#') => ('#', Relation::NotEqual),
            Some('<') => ('<', Relation::Less),
            Some('>') => ('>', Relation::Greater),
            _ => return Ok(()),
        };

        self.emit(|t| t.push())?;
        self.cursor.expect(symbol)?;

        self.expression()?;
        self.emit(|t| t.compare(relation))
    }
}
