//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI con tres modos: traducción interactiva
//! de sentencias sueltas, traducción de programas completos (con
//! construcción y ejecución opcionales) y generación de fixtures de
//! prueba a partir de especificaciones YAML.

use anyhow::{self, bail, Context};
use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};
use ds_compiler::{
    fixture,
    link::{self, BuildOptions, ProgramError, Toolchain},
    target::Cpp,
    Compiler, Diagnostics, Options,
};

use std::{
    fs::{self, File},
    io::{self, BufRead, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tracing_subscriber::EnvFilter;

/// Línea que termina el modo interactivo.
const QUIT_CHAR: char = '$';

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let registers = Arg::new("registers")
        .short('r')
        .long("registers")
        .value_name("N")
        .takes_value(true)
        .value_parser(clap::value_parser!(usize))
        .default_value("8")
        .help("Size of the emitted register array");

    let max_depth = Arg::new("max-depth")
        .long("max-depth")
        .value_name("N")
        .takes_value(true)
        .value_parser(clap::value_parser!(usize))
        .default_value("128")
        .help("Maximum nesting of parentheses, negations and blocks");

    // Parsing de CLI
    let args = Command::new("dsc")
        .about("Single-pass compiler from a toy language to a C++ stack machine")
        .version(crate_version!())
        .subcommand_required(true)
        .subcommand(
            Command::new("translate")
                .about("Translate statements interactively, one per line")
                .arg(registers.clone())
                .arg(max_depth.clone()),
        )
        .subcommand(
            Command::new("compile")
                .about("Translate a whole program into a C++ class")
                .arg(
                    Arg::new("input")
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Program source, one statement per line (stdin if absent)"),
                )
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .value_name("CLASS")
                        .takes_value(true)
                        .default_value("TestClass")
                        .help("Name of the emitted class"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .takes_value(true)
                        .default_value("-")
                        .help("Output file ('-' for stdout)"),
                )
                .arg(
                    Arg::new("executable")
                        .short('x')
                        .long("executable")
                        .value_name("FILE")
                        .takes_value(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .conflicts_with("output")
                        .help("Build an executable with the system C++ compiler ($CXX)"),
                )
                .arg(
                    Arg::new("strip")
                        .short('s')
                        .long("strip")
                        .action(ArgAction::SetTrue)
                        .help("Strip executables"),
                )
                .arg(
                    Arg::new("optimize")
                        .short('O')
                        .long("optimize")
                        .action(ArgAction::SetTrue)
                        .help("Build with optimizations"),
                )
                .arg(
                    Arg::new("run")
                        .long("run")
                        .action(ArgAction::SetTrue)
                        .help("Run the executable and print its final state"),
                )
                .arg(registers.clone())
                .arg(max_depth.clone()),
        )
        .subcommand(
            Command::new("fixtures")
                .about("Generate googletest fixtures from YAML test specifications")
                .arg(
                    Arg::new("specs")
                        .value_name("SPEC")
                        .required(true)
                        .multiple_values(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("YAML files with one or more test cases"),
                )
                .arg(
                    Arg::new("dir")
                        .short('o')
                        .long("output-dir")
                        .value_name("DIR")
                        .takes_value(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value(".")
                        .help("Directory for generated sources"),
                )
                .arg(registers)
                .arg(max_depth),
        )
        .get_matches();

    match args.subcommand() {
        Some(("translate", args)) => interactive(options(args)?),
        Some(("compile", args)) => batch(args),
        Some(("fixtures", args)) => fixtures(args),
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Extrae opciones de traducción.
fn options(args: &ArgMatches) -> anyhow::Result<Options> {
    let mut options = Options::default();

    if let Some(&registers) = args.get_one::<usize>("registers") {
        if registers == 0 {
            bail!("At least one register is required");
        }

        options.registers = registers;
    }

    if let Some(&max_depth) = args.get_one::<usize>("max-depth") {
        options.max_depth = max_depth;
    }

    Ok(options)
}

/// Traduce y muestra cada sentencia leída, sin detenerse ante errores.
fn interactive(options: Options) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut compiler = Compiler::with_options(Cpp::new(stdout.lock()), options);
    let prompt = format!("Enter a line to be compiled ('{}' to quit):", QUIT_CHAR);

    eprintln!("{}", prompt);
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.starts_with(QUIT_CHAR) {
            break;
        }

        if let Err(error) = compiler.translate_statement(&line) {
            eprint!("{}", Diagnostics::from(error));
        }

        eprintln!("{}", prompt);
    }

    Ok(())
}

/// Traduce un programa completo, opcionalmente construyéndolo y ejecutándolo.
fn batch(args: &ArgMatches) -> anyhow::Result<()> {
    let options = options(args)?;
    let name = args.get_one::<String>("name").expect("has default");
    let lines = read_program(args.get_one::<PathBuf>("input"))?;

    let executable = args.get_one::<PathBuf>("executable");
    if executable.is_none() && ["strip", "optimize", "run"].iter().any(|id| flag(args, id)) {
        bail!("--strip, --optimize and --run require --executable");
    }

    match executable {
        // Salida a ejecutable a través del compilador de C++
        Some(executable) => {
            let mut build_options = BuildOptions::empty();
            if flag(args, "strip") {
                build_options |= BuildOptions::STRIP;
            }

            if flag(args, "optimize") {
                build_options |= BuildOptions::OPTIMIZE;
            }

            let toolchain = Toolchain::from_env();
            let built = link::build_program(&toolchain, &lines, name, options, executable, build_options);

            match built {
                Ok(()) => (),
                Err(ProgramError::Translation(error)) => return Err(report(error)),
                Err(ProgramError::Build(error)) => {
                    return Err(anyhow::Error::new(error).context(format!(
                        "Failed to generate executable: {}",
                        executable.display()
                    )))
                }
            }

            if flag(args, "run") {
                let dump = link::execute(executable)
                    .with_context(|| format!("Failed to run: {}", executable.display()))?;

                print!("{}", dump);
            }
        }

        // Salida a stdout
        None if args.get_one::<String>("output").map(String::as_str) == Some("-") => {
            let stdout = io::stdout();
            let mut compiler = Compiler::with_options(Cpp::new(stdout.lock()), options);
            translate(&mut compiler, &lines, name)?;
        }

        // Salida a archivo
        None => {
            let path = args.get_one::<String>("output").expect("has default");
            let file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            let mut output = BufWriter::new(file);
            let mut compiler = Compiler::with_options(Cpp::new(&mut output), options);
            translate(&mut compiler, &lines, name)?;
            drop(compiler);

            output
                .flush()
                .with_context(|| format!("Failed to write to file: {}", path))?;
        }
    }

    Ok(())
}

/// Genera la clase y el fixture de cada caso de prueba.
fn fixtures(args: &ArgMatches) -> anyhow::Result<()> {
    let options = options(args)?;
    let dir = args.get_one::<PathBuf>("dir").expect("has default");

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut diagnostics = Diagnostics::default();
    for spec in args.get_many::<PathBuf>("specs").into_iter().flatten() {
        for case in fixture::load(spec)? {
            tracing::info!(case = %case.name, spec = %spec.display(), "generating fixture");

            let class_path = dir.join(case.class_file());
            let mut class = BufWriter::new(create(&class_path)?);
            if let Err(error) = case.write_class(options, &mut class) {
                diagnostics.push(error);
                continue;
            }

            class
                .flush()
                .with_context(|| format!("Failed to write to file: {}", class_path.display()))?;

            let test_path = dir.join(case.test_file());
            let mut test = BufWriter::new(create(&test_path)?);
            case.write_test(&mut test)
                .and_then(|()| test.flush())
                .with_context(|| format!("Failed to write to file: {}", test_path.display()))?;
        }
    }

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
        bail!("Some test cases failed to translate");
    }

    Ok(())
}

fn translate<W: Write>(compiler: &mut Compiler<Cpp<W>>, lines: &[String], name: &str) -> anyhow::Result<()> {
    compiler.translate_program(lines, name).map_err(report)
}

/// Escribe el reporte de un error de traducción al flujo de errores.
fn report(error: ds_compiler::source::Located<ds_compiler::CompileError>) -> anyhow::Error {
    eprint!("{}", Diagnostics::from(error));
    anyhow::anyhow!("Translation failed")
}

/// Lee las líneas de un programa, omitiendo líneas en blanco.
fn read_program(input: Option<&PathBuf>) -> anyhow::Result<Vec<String>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?,

        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;

            text
        }
    };

    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect())
}

fn flag(args: &ArgMatches, id: &str) -> bool {
    args.get_one::<bool>(id).copied().unwrap_or(false)
}

fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("Failed to open for writing: {}", path.display()))
}
