//! Emisión de C++.
//!
//! El programa emitido es una clase autocontenida. El acumulador es
//! `registers[0]`, la pila es un `std::stack<int>` y las variables
//! viven en un `std::unordered_map` indexado por nombre. Las lecturas
//! usan `variables.at()`, así que leer una variable nunca asignada
//! falla en tiempo de ejecución del programa emitido, no durante la
//! traducción.

use super::{BinOp, Emitter, Label, Relation, Test};
use std::io::{self, Write};

/// Ancho de un nivel de sangría.
const INDENT: usize = 4;

/// Prefijo de las funciones generadas, evita choques con miembros de la clase.
const STUB_PREFIX: &str = "fn_";

/// Emisor de C++ sobre un flujo de salida cualquiera.
pub struct Cpp<W> {
    output: W,
    depth: usize,
}

impl<W: Write> Cpp<W> {
    /// Crea un emisor que escribe sentencias sin sangría.
    pub fn new(output: W) -> Self {
        Cpp { output, depth: 0 }
    }

    /// Toma ownership del flujo de salida.
    pub fn into_inner(self) -> W {
        self.output
    }

    fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn indent(&mut self) -> io::Result<()> {
        write!(self.output, "{:width$}", "", width = self.depth * INDENT)
    }

    fn lines(&mut self, lines: &[&str]) -> io::Result<()> {
        for line in lines {
            if line.is_empty() {
                writeln!(self.output)?;
            } else {
                emit!(self, "{}", line)?;
            }
        }

        Ok(())
    }
}

impl<W: Write> Emitter for Cpp<W> {
    fn begin_program(&mut self, name: &str, registers: usize) -> io::Result<()> {
        self.depth = 0;
        self.lines(&[
            "#include <iostream>",
            "#include <stack>",
            "#include <string>",
            "#include <unordered_map>",
            "#include <vector>",
            "",
        ])?;

        emit!(self, "class {} {{", name)?;
        emit!(self, "private:")?;

        self.depth = 1;
        emit!(self, "static const int NUM_REGISTERS = {};", registers)?;
        self.lines(&[
            "",
            "std::stack<int> stack;",
            "std::vector<int> registers;",
            "std::unordered_map<std::string, int> variables;",
            "bool condition;",
            "",
        ])?;

        self.depth = 0;
        emit!(self, "public:")?;

        self.depth = 1;
        emit!(
            self,
            "{} () : stack(), registers(NUM_REGISTERS, 0), variables(), condition(false) {{}}",
            name
        )?;

        self.lines(&[
            "",
            "int pop () {",
            "    int top = stack.top();",
            "    stack.pop();",
            "    return top;",
            "}",
            "",
            "int get_register (int index) const {",
            "    return registers.at(index);",
            "}",
            "",
            "int get_variable (const std::string &name) const {",
            "    return variables.at(name);",
            "}",
            "",
            "bool is_stack_empty () const {",
            "    return stack.empty();",
            "}",
            "",
            "void run () {",
        ])?;

        self.depth = 2;
        Ok(())
    }

    fn end_program(&mut self, stubs: &[String]) -> io::Result<()> {
        self.depth = 1;
        self.lines(&[
            "}",
            "",
            "void dump () {",
            "    std::cout << \"registers:\";",
            "    for (int value : registers) {",
            "        std::cout << ' ' << value;",
            "    }",
            "    std::cout << '\\n';",
            "",
            "    std::cout << \"stack:\";",
            "    while (!stack.empty()) {",
            "        std::cout << ' ' << pop();",
            "    }",
            "    std::cout << '\\n';",
            "",
            "    std::cout << \"variables:\\n\";",
            "    for (const auto &variable : variables) {",
            "        std::cout << \"    \" << variable.first << \" = \" << variable.second << '\\n';",
            "    }",
            "}",
        ])?;

        if !stubs.is_empty() {
            writeln!(self.output)?;

            self.depth = 0;
            emit!(self, "private:")?;

            self.depth = 1;
            for stub in stubs {
                emit!(self, "int {}{} () {{", STUB_PREFIX, stub)?;
                emit!(self, "    return 0;")?;
                emit!(self, "}}")?;
            }
        }

        self.depth = 0;
        emit!(self, "}};")
    }

    fn entry_point(&mut self, name: &str) -> io::Result<()> {
        self.depth = 0;
        writeln!(self.output)?;

        emit!(self, "int main () {{")?;
        emit!(self, "    {} program;", name)?;
        self.lines(&[
            "    program.run();",
            "    program.dump();",
            "    return 0;",
            "}",
        ])
    }

    fn clear(&mut self) -> io::Result<()> {
        emit!(self, "registers[0] = 0;")
    }

    fn load_const(&mut self, digits: &str) -> io::Result<()> {
        emit!(self, "registers[0] = {};", digits)
    }

    fn load_bool(&mut self, value: bool) -> io::Result<()> {
        emit!(self, "registers[0] = {};", value as i32)
    }

    fn load_var(&mut self, name: &str) -> io::Result<()> {
        emit!(self, "registers[0] = variables.at(\"{}\");", name)
    }

    fn store_var(&mut self, name: &str) -> io::Result<()> {
        emit!(self, "variables[\"{}\"] = registers[0];", name)
    }

    fn call(&mut self, name: &str) -> io::Result<()> {
        emit!(self, "registers[0] = {}{}();", STUB_PREFIX, name)
    }

    fn push(&mut self) -> io::Result<()> {
        emit!(self, "stack.push(registers[0]);")
    }

    fn pop(&mut self) -> io::Result<()> {
        emit!(self, "registers[0] = pop();")
    }

    fn discard(&mut self) -> io::Result<()> {
        emit!(self, "stack.pop();")
    }

    fn combine(&mut self, op: BinOp) -> io::Result<()> {
        let operator = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
        };

        // El tope es el operando izquierdo, el orden importa para `-` y `/`
        emit!(self, "registers[0] = stack.top() {} registers[0];", operator)?;
        self.discard()
    }

    fn compare(&mut self, relation: Relation) -> io::Result<()> {
        let operator = match relation {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
            Relation::Less => "<",
            Relation::Greater => ">",
        };

        emit!(self, "condition = stack.top() {} registers[0];", operator)?;
        self.discard()?;
        emit!(self, "registers[0] = condition;")
    }

    fn not(&mut self) -> io::Result<()> {
        emit!(self, "registers[0] = !registers[0];")
    }

    fn step(&mut self, delta: i32) -> io::Result<()> {
        match delta {
            0 => Ok(()),
            delta if delta < 0 => emit!(self, "registers[0] = registers[0] - {};", -delta),
            delta => emit!(self, "registers[0] = registers[0] + {};", delta),
        }
    }

    fn test(&mut self, test: Test) -> io::Result<()> {
        match test {
            Test::AboveTop => emit!(self, "condition = registers[0] > stack.top();"),
            Test::NonPositive => emit!(self, "condition = registers[0] <= 0;"),
        }
    }

    fn label(&mut self, label: Label) -> io::Result<()> {
        // Las etiquetas van un nivel a la izquierda; `;` porque C++ no
        // admite una etiqueta justo antes de `}`
        let depth = self.depth;
        self.depth = depth.saturating_sub(1);

        let result = emit!(self, "{}: ;", label);
        self.depth = depth;

        result
    }

    fn jump(&mut self, label: Label) -> io::Result<()> {
        emit!(self, "goto {};", label)
    }

    fn jump_if_false(&mut self, label: Label) -> io::Result<()> {
        emit!(self, "if (!registers[0]) goto {};", label)
    }

    fn jump_if_condition(&mut self, label: Label) -> io::Result<()> {
        emit!(self, "if (condition) goto {};", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text<F>(emit: F) -> String
    where
        F: FnOnce(&mut Cpp<Vec<u8>>) -> io::Result<()>,
    {
        let mut cpp = Cpp::new(Vec::new());
        emit(&mut cpp).unwrap();
        String::from_utf8(cpp.into_inner()).unwrap()
    }

    #[test]
    fn subtraction_keeps_left_operand_on_top() {
        let output = text(|cpp| {
            cpp.push()?;
            cpp.load_const("5")?;
            cpp.combine(BinOp::Sub)
        });

        insta::assert_snapshot!(output, @r###"
        stack.push(registers[0]);
        registers[0] = 5;
        registers[0] = stack.top() - registers[0];
        stack.pop();
        "###);
    }

    #[test]
    fn comparisons_copy_condition() {
        let output = text(|cpp| cpp.compare(Relation::NotEqual));

        insta::assert_snapshot!(output, @r###"
        condition = stack.top() != registers[0];
        stack.pop();
        registers[0] = condition;
        "###);
    }

    #[test]
    fn empty_scaffold() {
        let output = text(|cpp| {
            cpp.begin_program("EmptyProgram", 8)?;
            cpp.end_program(&[])
        });

        assert!(output.starts_with("#include <iostream>\n"));
        assert!(output.contains("class EmptyProgram {\n"));
        assert!(output.contains("    static const int NUM_REGISTERS = 8;\n"));
        assert!(output.contains("    void run () {\n    }\n"));
        assert!(output.contains("    void dump () {\n"));
        assert!(!output.contains("fn_"));
        assert!(output.ends_with("};\n"));
    }

    #[test]
    fn stubs_follow_dump() {
        let output = text(|cpp| {
            cpp.begin_program("Calls", 4)?;
            cpp.call("FOO")?;
            cpp.end_program(&["FOO".to_string()])
        });

        assert!(output.contains("        registers[0] = fn_FOO();\n"));

        let dump = output.find("void dump").unwrap();
        let stub = output.find("int fn_FOO () {\n        return 0;\n    }").unwrap();
        assert!(stub > dump);
    }

    #[test]
    fn labels_are_outdented() {
        let output = text(|cpp| {
            cpp.begin_program("Labels", 8)?;
            cpp.label(Label(3))?;
            cpp.jump(Label(3))
        });

        assert!(output.ends_with("    L3: ;\n        goto L3;\n"));
    }
}
