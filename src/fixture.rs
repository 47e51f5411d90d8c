//! Casos de prueba declarativos.
//!
//! Un caso de prueba describe un programa fuente y los valores que su
//! traducción debe producir al ejecutarse:
//!
//! ```yaml
//! name: TheKitchenSink
//! program:
//!   - "intermediate=12+34-56*8/64"
//!   - "result=-(intermediate+123)*456"
//! expected:
//!   INTERMEDIATE: 39
//!   RESULT: -73872
//! ```
//!
//! Las llaves de `expected` son nombres de variable o, si son
//! numéricas, índices de registro. También se aceptan los nombres
//! `class_name`, `program_source` y `expected_values`. A partir de cada
//! caso se generan dos archivos: la clase traducida y un fixture de
//! googletest que la ejecuta y verifica los valores esperados. Los casos
//! también pueden escribirse de vuelta como YAML con [`write()`].

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
    compile::{Compiler, Options},
    error::Compile,
    target::Cpp,
};

/// Error al cargar casos de prueba.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed test specification {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Un caso de prueba.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestCase {
    /// Nombre de la clase emitida.
    #[serde(alias = "class_name")]
    pub name: String,

    /// Sentencias, una por línea.
    #[serde(alias = "program_source", default)]
    pub program: Vec<String>,

    /// Valores esperados luego de `run()`.
    #[serde(alias = "expected_values", default)]
    pub expected: BTreeMap<Probe, i64>,
}

/// Ubicación observable del estado final de un programa.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Probe {
    Register(usize),
    Variable(String),
}

impl FromStr for Probe {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let string = string.trim();

        if string.starts_with(|c: char| c.is_ascii_digit()) {
            string.parse().map(Probe::Register).map_err(drop)
        } else if string.starts_with(|c: char| c.is_ascii_alphabetic())
            && string.chars().all(|c| c.is_ascii_alphanumeric())
        {
            Ok(Probe::Variable(string.to_ascii_uppercase()))
        } else {
            Err(())
        }
    }
}

impl Display for Probe {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Register(index) => write!(fmt, "register {}", index),
            Probe::Variable(name) => fmt.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Probe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProbeVisitor;

        impl<'de> de::Visitor<'de> for ProbeVisitor {
            type Value = Probe;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt.write_str("a variable name or a register index")
            }

            fn visit_u64<E: de::Error>(self, index: u64) -> Result<Probe, E> {
                Ok(Probe::Register(index as usize))
            }

            fn visit_i64<E: de::Error>(self, index: i64) -> Result<Probe, E> {
                if index < 0 {
                    Err(E::invalid_value(de::Unexpected::Signed(index), &self))
                } else {
                    Ok(Probe::Register(index as usize))
                }
            }

            fn visit_str<E: de::Error>(self, string: &str) -> Result<Probe, E> {
                string
                    .parse()
                    .map_err(|()| E::invalid_value(de::Unexpected::Str(string), &self))
            }
        }

        deserializer.deserialize_any(ProbeVisitor)
    }
}

impl Serialize for Probe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Probe::Register(index) => serializer.serialize_u64(*index as u64),
            Probe::Variable(name) => serializer.serialize_str(name),
        }
    }
}

/// Un archivo de especificación contiene un caso o una secuencia de ellos.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cases {
    Many(Vec<TestCase>),
    One(TestCase),
}

/// Interpreta casos de prueba en YAML.
pub fn parse(text: &str) -> Result<Vec<TestCase>, serde_yaml::Error> {
    let cases = match serde_yaml::from_str(text)? {
        Cases::Many(cases) => cases,
        Cases::One(case) => vec![case],
    };

    Ok(cases)
}

/// Escribe casos de prueba como una secuencia YAML.
pub fn write<W: Write>(cases: &[TestCase], output: W) -> Result<(), serde_yaml::Error> {
    serde_yaml::to_writer(output, cases)
}

/// Carga casos de prueba desde un archivo YAML.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<TestCase>, FixtureError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_owned(),
        source,
    })?;

    parse(&text).map_err(|source| FixtureError::Malformed {
        path: path.to_owned(),
        source,
    })
}

impl TestCase {
    /// Nombre del archivo de la clase traducida.
    pub fn class_file(&self) -> String {
        format!("{}.cc", self.name)
    }

    /// Nombre del archivo del fixture.
    pub fn test_file(&self) -> String {
        format!("{}Test.cc", self.name)
    }

    /// Emite la clase traducida.
    pub fn write_class<W: Write>(&self, options: Options, output: W) -> Compile<()> {
        let mut compiler = Compiler::with_options(Cpp::new(output), options);
        compiler.translate_program(&self.program, &self.name)
    }

    /// Emite el fixture de googletest que ejecuta y verifica a la clase.
    pub fn write_test<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let fixture = format!("{}Class", self.name);

        writeln!(output, "#include \"gtest/gtest.h\"")?;
        writeln!(output, "#include \"{}\"", self.class_file())?;
        writeln!(output)?;

        writeln!(output, "class {} : public ::testing::Test {{", fixture)?;
        writeln!(output, "public:")?;
        writeln!(output, "    {} tested_object;", self.name)?;
        writeln!(output)?;
        writeln!(output, "    {} () : tested_object() {{", fixture)?;
        writeln!(output, "        tested_object.run();")?;
        writeln!(output, "    }}")?;
        writeln!(output, "}};")?;
        writeln!(output)?;

        writeln!(output, "TEST_F({}, GetsCorrectResults) {{", fixture)?;
        for (probe, value) in &self.expected {
            let accessor = match probe {
                Probe::Register(index) => format!("get_register({})", index),
                Probe::Variable(name) => format!("get_variable(\"{}\")", name),
            };

            writeln!(output, "    EXPECT_EQ({}, tested_object.{});", value, accessor)?;
        }
        writeln!(output, "}}")?;
        writeln!(output)?;

        writeln!(output, "TEST_F({}, EmptiesStack) {{", fixture)?;
        writeln!(output, "    EXPECT_TRUE(tested_object.is_stack_empty());")?;
        writeln!(output, "}}")
    }
}
