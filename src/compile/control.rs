//! Sentencias y bloques.
//!
//! Las palabras clave son letras sueltas: `i` (if), `l` (else), `e`
//! (end), `w` (while), `p` (loop), `r` (repeat), `u` (until), `f`
//! (for), `d` (do) y `b` (break). Una sentencia que no empieza con
//! palabra clave es una asignación (`nombre = expresión`) o una
//! expresión suelta cuyo valor queda en el acumulador. La `f` solo
//! inicia un `for` si le sigue el nombre del contador; si no, es el
//! literal falso.
//!
//! Cada ciclo entrega a su cuerpo la etiqueta a la cual salta `b`.
//! Fuera de todo ciclo esa etiqueta es `None` y `b` es un error.

use super::Parser;
use crate::{
    error::{Compile, CompileError},
    target::{Emitter, Label, Test},
};

/// Palabra clave de sentencia.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Keyword {
    If,
    Else,
    End,
    While,
    Loop,
    Repeat,
    Until,
    For,
    Do,
    Break,
}

impl Keyword {
    const ALL: [Keyword; 10] = [
        Keyword::If,
        Keyword::Else,
        Keyword::End,
        Keyword::While,
        Keyword::Loop,
        Keyword::Repeat,
        Keyword::Until,
        Keyword::For,
        Keyword::Do,
        Keyword::Break,
    ];

    fn letter(self) -> char {
        use Keyword::*;

        match self {
            If => 'i',
            Else => 'l',
            End => 'e',
            While => 'w',
            Loop => 'p',
            Repeat => 'r',
            Until => 'u',
            For => 'f',
            Do => 'd',
            Break => 'b',
        }
    }

    /// Palabras clave que cierran un bloque.
    fn ends_block(self) -> bool {
        matches!(self, Keyword::End | Keyword::Else | Keyword::Until)
    }
}

impl<E: Emitter> Parser<'_, E> {
    /// Determina si el bloque en curso termina aquí.
    pub(super) fn at_block_end(&self) -> bool {
        matches!(self.keyword(), Some(keyword) if keyword.ends_block())
    }

    pub(super) fn statement(&mut self, exit: Option<Label>) -> Compile<()> {
        match self.keyword() {
            Some(Keyword::If) => self.if_statement(exit),
            Some(Keyword::While) => self.while_statement(),
            Some(Keyword::Loop) => self.loop_statement(),
            Some(Keyword::Repeat) => self.repeat_statement(),
            Some(Keyword::For) => self.for_statement(),
            Some(Keyword::Do) => self.do_statement(),
            Some(Keyword::Break) => self.break_statement(exit),
            _ if self.cursor.at_assignment() => self.assignment(),
            _ => self.boolean_expression(),
        }
    }

    fn block(&mut self, exit: Option<Label>) -> Compile<()> {
        self.nested(|s| {
            while !s.cursor.at_end() && !s.at_block_end() {
                s.statement(exit)?;
            }

            Ok(())
        })
    }

    fn if_statement(&mut self, exit: Option<Label>) -> Compile<()> {
        self.keyword_token(Keyword::If)?;
        self.boolean_expression()?;

        let otherwise = self.new_label();
        self.emit(|t| t.jump_if_false(otherwise))?;
        self.block(exit)?;

        if self.keyword() == Some(Keyword::Else) {
            self.keyword_token(Keyword::Else)?;

            let end = self.new_label();
            self.emit(|t| t.jump(end))?;
            self.emit(|t| t.label(otherwise))?;

            self.block(exit)?;
            self.emit(|t| t.label(end))?;
        } else {
            self.emit(|t| t.label(otherwise))?;
        }

        self.keyword_token(Keyword::End)
    }

    fn while_statement(&mut self) -> Compile<()> {
        self.keyword_token(Keyword::While)?;

        let (start, end) = (self.new_label(), self.new_label());
        self.emit(|t| t.label(start))?;

        self.boolean_expression()?;
        self.emit(|t| t.jump_if_false(end))?;

        self.block(Some(end))?;
        self.keyword_token(Keyword::End)?;

        self.emit(|t| t.jump(start))?;
        self.emit(|t| t.label(end))
    }

    fn loop_statement(&mut self) -> Compile<()> {
        self.keyword_token(Keyword::Loop)?;

        // Solo `b` alcanza a la etiqueta final
        let (start, end) = (self.new_label(), self.new_label());
        self.emit(|t| t.label(start))?;

        self.block(Some(end))?;
        self.keyword_token(Keyword::End)?;

        self.emit(|t| t.jump(start))?;
        self.emit(|t| t.label(end))
    }

    fn repeat_statement(&mut self) -> Compile<()> {
        self.keyword_token(Keyword::Repeat)?;

        let (start, end) = (self.new_label(), self.new_label());
        self.emit(|t| t.label(start))?;

        self.block(Some(end))?;
        self.keyword_token(Keyword::Until)?;

        self.boolean_expression()?;
        self.emit(|t| t.jump_if_false(start))?;
        self.emit(|t| t.label(end))
    }

    /// `f nombre = inicio límite ... e`
    fn for_statement(&mut self) -> Compile<()> {
        self.keyword_token(Keyword::For)?;

        let (start, end) = (self.new_label(), self.new_label());
        let counter = self.cursor.name()?;
        self.cursor.expect('=')?;

        // El contador arranca uno abajo porque se incrementa antes de cada prueba
        self.expression()?;
        self.emit(|t| t.step(-1))?;
        self.emit(|t| t.store_var(&counter))?;

        // El límite vive en la pila durante todo el ciclo
        self.expression()?;
        self.emit(|t| t.push())?;

        self.emit(|t| t.label(start))?;
        self.emit(|t| t.load_var(&counter))?;
        self.emit(|t| t.step(1))?;
        self.emit(|t| t.store_var(&counter))?;
        self.emit(|t| t.test(Test::AboveTop))?;
        self.emit(|t| t.jump_if_condition(end))?;

        self.block(Some(end))?;
        self.keyword_token(Keyword::End)?;

        self.emit(|t| t.jump(start))?;
        self.emit(|t| t.label(end))?;
        self.emit(|t| t.discard())
    }

    /// `d cuenta ... e`
    fn do_statement(&mut self) -> Compile<()> {
        self.keyword_token(Keyword::Do)?;

        let (start, end, escape) = (self.new_label(), self.new_label(), self.new_label());
        self.expression()?;

        self.emit(|t| t.label(start))?;
        self.emit(|t| t.test(Test::NonPositive))?;
        self.emit(|t| t.jump_if_condition(end))?;
        self.emit(|t| t.push())?;

        self.block(Some(escape))?;
        self.keyword_token(Keyword::End)?;

        self.emit(|t| t.pop())?;
        self.emit(|t| t.step(-1))?;
        self.emit(|t| t.jump(start))?;

        // `b` abandona el cuerpo con la cuenta todavía apilada
        self.emit(|t| t.label(escape))?;
        self.emit(|t| t.discard())?;
        self.emit(|t| t.label(end))
    }

    fn break_statement(&mut self, exit: Option<Label>) -> Compile<()> {
        let exit = match exit {
            Some(label) => label,
            None => return self.cursor.fail(CompileError::NoLoop),
        };

        self.keyword_token(Keyword::Break)?;
        self.emit(|t| t.jump(exit))
    }

    fn assignment(&mut self) -> Compile<()> {
        let name = self.cursor.name()?;
        self.cursor.expect('=')?;

        self.boolean_expression()?;
        self.emit(|t| t.store_var(&name))
    }

    fn keyword(&self) -> Option<Keyword> {
        Keyword::ALL
            .iter()
            .copied()
            .find(|keyword| self.cursor.standalone(keyword.letter()))
            // `f` sin contador es el literal falso
            .filter(|&keyword| keyword != Keyword::For || self.cursor.followed_by_name())
    }

    fn keyword_token(&mut self, keyword: Keyword) -> Compile<()> {
        self.cursor.expect(keyword.letter())
    }
}
