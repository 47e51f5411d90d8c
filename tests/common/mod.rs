//! Máquina de pila que ejecuta directamente las primitivas emitidas.
//!
//! Permite verificar la semántica de una traducción sin pasar por un
//! compilador de C++. Cada primitiva se registra como una [`Op`] y
//! luego [`Machine::run()`] interpreta la secuencia con el mismo
//! modelo que la clase emitida: acumulador en `registers[0]`, pila,
//! tabla de variables y bandera de condición.

#![allow(dead_code)]

use std::{collections::HashMap, io};

use ds_compiler::{
    target::{BinOp, Emitter, Label, Relation, Test},
    Compile, Compiler, Options,
};

/// Pasos máximos antes de declarar un ciclo infinito.
const STEP_LIMIT: usize = 1_000_000;

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Clear,
    Const(i32),
    Bool(bool),
    Load(String),
    Store(String),
    Call(String),
    Push,
    Pop,
    Discard,
    Combine(BinOp),
    Compare(Relation),
    Not,
    Step(i32),
    Test(Test),
    Label(Label),
    Jump(Label),
    JumpIfFalse(Label),
    JumpIfCondition(Label),
}

#[derive(Debug, PartialEq)]
pub enum Fault {
    UnknownVariable(String),
    EmptyStack,
    DivideByZero,
    UnknownLabel(Label),
    Runaway,
}

/// Estado final observable, igual al que vuelca `dump()`.
#[derive(Debug, Default)]
pub struct State {
    pub registers: Vec<i32>,
    pub stack: Vec<i32>,
    pub variables: HashMap<String, i32>,
    pub condition: bool,
}

impl State {
    pub fn acc(&self) -> i32 {
        self.registers[0]
    }

    pub fn var(&self, name: &str) -> i32 {
        match self.variables.get(name) {
            Some(&value) => value,
            None => panic!("variable {} was never assigned", name),
        }
    }

    fn top(&self) -> Result<i32, Fault> {
        self.stack.last().copied().ok_or(Fault::EmptyStack)
    }

    fn pop(&mut self) -> Result<i32, Fault> {
        self.stack.pop().ok_or(Fault::EmptyStack)
    }
}

#[derive(Debug, Default)]
pub struct Machine {
    pub ops: Vec<Op>,
    pub name: Option<String>,
    pub registers: usize,
    pub stubs: Vec<String>,
    pub finished: bool,
}

impl Machine {
    /// Interpreta las operaciones registradas.
    pub fn run(&self) -> Result<State, Fault> {
        let labels: HashMap<Label, usize> = self
            .ops
            .iter()
            .enumerate()
            .filter_map(|(index, op)| match op {
                Op::Label(label) => Some((*label, index)),
                _ => None,
            })
            .collect();

        let target = |label: &Label| labels.get(label).copied().ok_or(Fault::UnknownLabel(*label));

        let mut state = State {
            registers: vec![0; self.registers.max(1)],
            ..State::default()
        };

        let mut pc = 0;
        for _ in 0..STEP_LIMIT {
            let op = match self.ops.get(pc) {
                Some(op) => op,
                None => return Ok(state),
            };

            pc += 1;
            let acc = state.registers[0];

            match op {
                Op::Clear => state.registers[0] = 0,
                Op::Const(value) => state.registers[0] = *value,
                Op::Bool(value) => state.registers[0] = *value as i32,
                Op::Load(name) => {
                    state.registers[0] = *state
                        .variables
                        .get(name)
                        .ok_or_else(|| Fault::UnknownVariable(name.clone()))?;
                }
                Op::Store(name) => {
                    state.variables.insert(name.clone(), acc);
                }
                Op::Call(_) => state.registers[0] = 0,
                Op::Push => state.stack.push(acc),
                Op::Pop => state.registers[0] = state.pop()?,
                Op::Discard => {
                    state.pop()?;
                }
                Op::Combine(op) => {
                    let left = state.pop()?;
                    state.registers[0] = match op {
                        BinOp::Add => left.wrapping_add(acc),
                        BinOp::Sub => left.wrapping_sub(acc),
                        BinOp::Mul => left.wrapping_mul(acc),
                        BinOp::Div if acc == 0 => return Err(Fault::DivideByZero),
                        BinOp::Div => left.wrapping_div(acc),
                        BinOp::And => left & acc,
                        BinOp::Or => left | acc,
                        BinOp::Xor => left ^ acc,
                    };
                }
                Op::Compare(relation) => {
                    let left = state.pop()?;
                    state.condition = match relation {
                        Relation::Equal => left == acc,
                        Relation::NotEqual => left != acc,
                        Relation::Less => left < acc,
                        Relation::Greater => left > acc,
                    };
                    state.registers[0] = state.condition as i32;
                }
                Op::Not => state.registers[0] = (acc == 0) as i32,
                Op::Step(delta) => state.registers[0] = acc.wrapping_add(*delta),
                Op::Test(Test::AboveTop) => state.condition = acc > state.top()?,
                Op::Test(Test::NonPositive) => state.condition = acc <= 0,
                Op::Label(_) => (),
                Op::Jump(label) => pc = target(label)?,
                Op::JumpIfFalse(label) => {
                    if acc == 0 {
                        pc = target(label)?;
                    }
                }
                Op::JumpIfCondition(label) => {
                    if state.condition {
                        pc = target(label)?;
                    }
                }
            }
        }

        Err(Fault::Runaway)
    }

    pub fn labels(&self) -> Vec<Label> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Label(label) => Some(*label),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, op: Op) -> io::Result<()> {
        self.ops.push(op);
        Ok(())
    }
}

impl Emitter for Machine {
    fn begin_program(&mut self, name: &str, registers: usize) -> io::Result<()> {
        self.name = Some(name.to_string());
        self.registers = registers;
        Ok(())
    }

    fn end_program(&mut self, stubs: &[String]) -> io::Result<()> {
        self.stubs = stubs.to_vec();
        self.finished = true;
        Ok(())
    }

    fn entry_point(&mut self, _name: &str) -> io::Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.record(Op::Clear)
    }

    fn load_const(&mut self, digits: &str) -> io::Result<()> {
        let value = digits
            .parse()
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

        self.record(Op::Const(value))
    }

    fn load_bool(&mut self, value: bool) -> io::Result<()> {
        self.record(Op::Bool(value))
    }

    fn load_var(&mut self, name: &str) -> io::Result<()> {
        self.record(Op::Load(name.to_string()))
    }

    fn store_var(&mut self, name: &str) -> io::Result<()> {
        self.record(Op::Store(name.to_string()))
    }

    fn call(&mut self, name: &str) -> io::Result<()> {
        self.record(Op::Call(name.to_string()))
    }

    fn push(&mut self) -> io::Result<()> {
        self.record(Op::Push)
    }

    fn pop(&mut self) -> io::Result<()> {
        self.record(Op::Pop)
    }

    fn discard(&mut self) -> io::Result<()> {
        self.record(Op::Discard)
    }

    fn combine(&mut self, op: BinOp) -> io::Result<()> {
        self.record(Op::Combine(op))
    }

    fn compare(&mut self, relation: Relation) -> io::Result<()> {
        self.record(Op::Compare(relation))
    }

    fn not(&mut self) -> io::Result<()> {
        self.record(Op::Not)
    }

    fn step(&mut self, delta: i32) -> io::Result<()> {
        self.record(Op::Step(delta))
    }

    fn test(&mut self, test: Test) -> io::Result<()> {
        self.record(Op::Test(test))
    }

    fn label(&mut self, label: Label) -> io::Result<()> {
        self.record(Op::Label(label))
    }

    fn jump(&mut self, label: Label) -> io::Result<()> {
        self.record(Op::Jump(label))
    }

    fn jump_if_false(&mut self, label: Label) -> io::Result<()> {
        self.record(Op::JumpIfFalse(label))
    }

    fn jump_if_condition(&mut self, label: Label) -> io::Result<()> {
        self.record(Op::JumpIfCondition(label))
    }
}

/// Traduce un programa completo hacia la máquina.
pub fn translate<S: AsRef<str>>(lines: &[S]) -> Compile<Machine> {
    let mut compiler = Compiler::with_options(Machine::default(), Options::default());
    compiler.translate_program(lines, "Simulated")?;

    Ok(compiler.into_target())
}

/// Traduce y ejecuta un programa, fallando ante cualquier error.
pub fn run(lines: &[&str]) -> State {
    let machine = translate(lines).unwrap_or_else(|error| panic!("{:?}: {}", lines, error.val()));
    machine
        .run()
        .unwrap_or_else(|fault| panic!("{:?} faulted: {:?}", lines, fault))
}
