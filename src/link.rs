//! Construcción de ejecutables.
//!
//! El código emitido es C++ autocontenido. Para ejecutarlo se envía,
//! junto a un punto de entrada, a la entrada estándar de un compilador
//! de C++ del sistema, el cual produce el ejecutable final. Si la
//! traducción falla a medio camino, el compilador se detiene antes de
//! recibir el resto del código.

use std::{
    env,
    ffi::OsString,
    fs,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, ExitStatus, Stdio},
};

use bitflags::bitflags;
use thiserror::Error;

use crate::{
    compile::{Compiler, Options},
    error::CompileError,
    source::Located,
    target::Cpp,
};

/// Compilador de C++ a utilizar si `CXX` no está definida.
const DEFAULT_CXX: &str = "g++";

bitflags! {
    /// Opciones a aplicar durante la construcción.
    pub struct BuildOptions: u32 {
        /// Remover símbolos de depuración del ejecutable final.
        const STRIP = 0x01;

        /// Compilar con optimizaciones.
        const OPTIMIZE = 0x02;
    }
}

/// Un error de compilación o ejecución externa.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BuildError {
    /// Ocurrió un evento de error de E/S durante la invocación
    /// de comandos externos.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// El compilador inició su ejecución, pero falló en compilar.
    #[error("C++ compiler exited with status code {0:?}")]
    Failed(ExitStatus),

    /// El ejecutable construido terminó con error.
    #[error("Program exited with status code {0:?}")]
    Crashed(ExitStatus),
}

/// Falla al construir un programa a partir de código fuente.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// El programa no pudo traducirse; el compilador de C++ fue detenido.
    #[error("Translation failed")]
    Translation(Located<CompileError>),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Compilador de C++ del sistema.
#[derive(Clone, Debug)]
pub struct Toolchain {
    command: OsString,
}

impl Toolchain {
    /// Utiliza `command` como compilador.
    pub fn new<C: Into<OsString>>(command: C) -> Self {
        Toolchain {
            command: command.into(),
        }
    }

    /// Toma el compilador de `CXX`, o `g++` en su ausencia.
    pub fn from_env() -> Self {
        let command = env::var_os("CXX").unwrap_or_else(|| DEFAULT_CXX.into());
        Toolchain::new(command)
    }

    /// Arma el comando de compilación sin ejecutarlo.
    pub fn command<O: AsRef<Path>>(&self, output: O, options: BuildOptions) -> Command {
        let mut command = Command::new(&self.command);
        command
            // El código fuente llega por stdin
            .args(&["-std=c++11", "-x", "c++", "-"])
            .arg("-o")
            .arg(output.as_ref())
            .stdin(Stdio::piped());

        if options.contains(BuildOptions::STRIP) {
            command.arg("-s");
        }

        if options.contains(BuildOptions::OPTIMIZE) {
            command.arg("-O2");
        }

        command
    }
}

/// Instancia del compilador para un ejecutable definido.
pub struct Build {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    output: PathBuf,
}

impl Build {
    /// Inicia una instancia del compilador.
    ///
    /// El compilador tratará de emitir un ejecutable y escribirlo a
    /// la ruta indicada por `output`.
    pub fn spawn<O>(toolchain: &Toolchain, output: O, options: BuildOptions) -> Result<Self, BuildError>
    where
        O: AsRef<Path>,
    {
        let mut command = toolchain.command(&output, options);
        tracing::info!(?command, "spawning C++ compiler");

        let mut child = command.spawn()?;
        let stdin = match child.stdin.take() {
            Some(stdin) => BufWriter::new(stdin),
            None => {
                let _ = child.kill();
                return Err(BuildError::Io(std::io::ErrorKind::BrokenPipe.into()));
            }
        };

        Ok(Build {
            child,
            stdin,
            output: output.as_ref().to_owned(),
        })
    }

    /// Obtiene la entrada estándar del proceso que espera recibir C++.
    pub fn stdin(&mut self) -> &mut BufWriter<ChildStdin> {
        &mut self.stdin
    }

    /// Indica el fin del código fuente y espera a que termine la compilación.
    pub fn finish(mut self) -> Result<(), BuildError> {
        self.stdin.into_inner().map_err(|error| error.into_error())?;

        let status = self.child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Failed(status))
        }
    }

    /// Detiene al compilador sin entregarle el código pendiente.
    ///
    /// Cualquier ejecutable parcial que haya alcanzado a escribirse se elimina.
    pub fn abort(mut self) -> Result<(), BuildError> {
        tracing::info!(output = %self.output.display(), "aborting C++ compiler");

        // Puede haber terminado por su cuenta
        let _ = self.child.kill();
        self.child.wait()?;

        let Build { stdin, output, .. } = self;
        // El búfer pendiente se descarta, la tubería ya no tiene lector
        let _ = stdin.into_parts();

        match fs::remove_file(&output) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

/// Traduce un programa completo y lo construye como ejecutable.
///
/// El compilador de C++ recibe la clase y un punto de entrada que
/// ejecuta `run()` y `dump()`. Ante un error de traducción se invoca
/// [`Build::abort()`], así que el compilador nunca procesa una clase
/// incompleta.
pub fn build_program<I, S, O>(
    toolchain: &Toolchain,
    lines: I,
    name: &str,
    options: Options,
    output: O,
    build_options: BuildOptions,
) -> Result<(), ProgramError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    O: AsRef<Path>,
{
    let mut build = Build::spawn(toolchain, output, build_options)?;

    let mut compiler = Compiler::with_options(Cpp::new(build.stdin()), options);
    let translated = compiler
        .translate_program(lines, name)
        .and_then(|()| compiler.entry_point(name));

    drop(compiler);
    match translated {
        Ok(()) => Ok(build.finish()?),
        Err(error) => {
            build.abort()?;
            Err(ProgramError::Translation(error))
        }
    }
}

/// Ejecuta un programa construido y captura su salida estándar.
pub fn execute<P: AsRef<Path>>(executable: P) -> Result<String, BuildError> {
    let executable = executable.as_ref();
    tracing::info!(executable = %executable.display(), "running program");

    let output = Command::new(executable).stderr(Stdio::inherit()).output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(BuildError::Crashed(output.status))
    }
}
