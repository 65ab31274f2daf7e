//! `cfg-tool`: reads a grammar description file, runs the actions named in
//! its `action` meta line, and writes one output file per action next to
//! the input, mirroring `examples/original_source/main.py`.
//!
//! Argument handling, output-path decoration, and the interactive REPL's
//! I/O loop are ambient plumbing around the library's core operations
//! (`spec.md` §1 calls these "out of scope"); this binary owns all of it
//! and never implements a derivation or normalization step itself.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cfg_tools::cnf;
use cfg_tools::cyk;
use cfg_tools::error::CfgError;
use cfg_tools::grammar::{Grammar, MinimalFormat};
use cfg_tools::interactive::InteractiveDriver;
use cfg_tools::pda;
use cfg_tools::text::{self, Mode};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(path_arg) = args.next() else {
        eprintln!("usage: cfg-tool <txt_path>");
        return ExitCode::FAILURE;
    };
    let path = PathBuf::from(path_arg);

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Parsing input file...");
    let document = match text::parse_document(&text) {
        Ok(document) => document,
        Err(CfgError::MissingFormat) => {
            println!("Format is unspecified! Include `format xxx` in the text file.");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Parsing success!");

    if document.mode == Mode::Pda {
        for action in &document.actions {
            log::warn!("Unknown action '{}' for mode pda", action.to_lowercase());
        }
        return ExitCode::SUCCESS;
    }

    for action in &document.actions {
        let action = action.to_lowercase();
        log::info!("{}: Starting...", capitalize(&action));
        let outcome = run_action(&action, &document.grammar, &path);
        match outcome {
            ActionOutcome::Ran => log::info!("{}: Success!", capitalize(&action)),
            ActionOutcome::Unknown => {
                println!("Unknown action '{}' for mode cfg", action);
            }
            ActionOutcome::Skipped(reason) => {
                println!("{}", reason);
            }
        }
    }

    ExitCode::SUCCESS
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

enum ActionOutcome {
    Ran,
    Unknown,
    Skipped(String),
}

fn run_action(action: &str, grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    match action {
        "clone" => clone_action(grammar, original_path, None),
        "clone_char" => clone_action(grammar, original_path, Some(MinimalFormat::Char)),
        "clone_spaced" => clone_action(grammar, original_path, Some(MinimalFormat::Spaced)),
        "clone_spaced!" => clone_action(grammar, original_path, Some(MinimalFormat::SpacedExclaim)),
        "latex" => latex_action(grammar, original_path),
        "cnf" => cnf_action(grammar, original_path),
        "pda" => pda_action(grammar, original_path),
        "cyk" => cyk_action(grammar, original_path),
        "interactive" => interactive_action(grammar, original_path),
        _ => ActionOutcome::Unknown,
    }
}

fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let mut name = format!("{}_{}", stem, suffix);
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    path.with_file_name(name)
}

fn write_output(path: &Path, content: &str) -> ActionOutcome {
    match std::fs::write(path, content) {
        Ok(()) => ActionOutcome::Ran,
        Err(err) => ActionOutcome::Skipped(format!("failed to write {}: {}", path.display(), err)),
    }
}

fn clone_action(grammar: &Grammar, original_path: &Path, format: Option<MinimalFormat>) -> ActionOutcome {
    let format = format.unwrap_or_else(|| grammar.minimal_format());
    let output_path = path_with_suffix(original_path, "clone");
    let header = format!("mode cfg\nformat {}\naction\n\n", format);
    let content = header + &grammar.to_format(format);
    write_output(&output_path, &content)
}

fn latex_action(grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    let output_path = path_with_suffix(original_path, "latex");
    write_output(&output_path, &grammar.to_latex())
}

fn cnf_action(grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    if grammar.start_variable().is_none() {
        return ActionOutcome::Skipped(
            "Start variable required for this action!\nPlease define `start xxx` in the input file"
                .to_string(),
        );
    }
    log::debug!("Doing START, BIN, DEL, UNIT, TERM...");
    let trace = cnf::normalize(grammar);
    let final_grammar = trace.result();
    let final_content = format!(
        "{}\n\n{}",
        final_grammar.to_minimal_format_string(),
        final_grammar.to_latex()
    );
    let final_path = path_with_suffix(original_path, "cnf");
    let process_path = path_with_suffix(original_path, "cnf_process");
    if let ActionOutcome::Skipped(reason) = write_output(&process_path, &trace.to_report()) {
        return ActionOutcome::Skipped(reason);
    }
    write_output(&final_path, &final_content)
}

fn pda_action(grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    if grammar.start_variable().is_none() {
        return ActionOutcome::Skipped(
            "Start variable required for this action!\nPlease define `start xxx` in the input file"
                .to_string(),
        );
    }
    let compiled = pda::compile(grammar);
    let output_path = path_with_suffix(original_path, "pda");
    write_output(&output_path, &compiled.to_text())
}

fn cyk_action(grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("Input the word to test: (Format is 'spaced!')");
    let Some(Ok(line)) = lines.next() else {
        return ActionOutcome::Skipped("No input word provided for cyk action.".to_string());
    };
    let word = match text::word_spaced_exclaim(&line) {
        Ok(word) => word,
        Err(err) => return ActionOutcome::Skipped(format!("{}", err)),
    };

    let table = if word.is_empty() {
        None
    } else {
        Some(cyk::CykTable::fill(grammar, &word))
    };
    let pretty = table
        .as_ref()
        .map(|t| t.to_pretty_string())
        .unwrap_or_else(|| "(empty word: no table, checking directly for a nulling start rule)".to_string());
    println!("Processed CYK table!\n{}", pretty);

    let recognized = cyk::recognize(grammar, &word);
    let table_path = path_with_suffix(original_path, "cyk_table");
    if let ActionOutcome::Skipped(reason) = write_output(&table_path, &pretty) {
        return ActionOutcome::Skipped(reason);
    }

    if recognized {
        let Some(start) = grammar.start_variable() else {
            return ActionOutcome::Skipped(CfgError::MissingStartVariable.to_string());
        };
        println!("Start variable {} is in the final cell, creating parse tree...", start.name());
        match cyk::derive_witness(grammar, &word) {
            Some(tree) => {
                let derivation_path = path_with_suffix(original_path, "cyk_derivation");
                write_output(&derivation_path, &tree.string_derivation());
            }
            None => log::warn!("recognized word had no reconstructible witness"),
        }
    } else {
        println!(
            "Word is not recognized! Did you run CNF on the CFG yet?"
        );
    }
    ActionOutcome::Ran
}

fn interactive_action(grammar: &Grammar, original_path: &Path) -> ActionOutcome {
    let mut driver = match InteractiveDriver::new(grammar) {
        Ok(driver) => driver,
        Err(err) => return ActionOutcome::Skipped(format!("{}", err)),
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("{}", driver.prompt_state());
        print!("Select a variable: (undo with 'u', quit with 'q')\n  > ");
        io::stdout().flush().ok();
        let Some(Ok(raw)) = lines.next() else { break };
        let choice = raw.trim().to_lowercase();
        match choice.as_str() {
            "q" => break,
            "u" => {
                if driver.undo().is_err() {
                    println!("Cannot undo!");
                }
            }
            _ => match choice.parse::<usize>() {
                Ok(index) => match driver.choices(index) {
                    Ok(rules) if rules.len() == 1 => {
                        driver.expand(index, 0).ok();
                    }
                    Ok(rules) => {
                        let mut sorted: Vec<(usize, String)> = rules
                            .iter()
                            .enumerate()
                            .map(|(i, r)| (i, r.to_string()))
                            .collect();
                        sorted.sort_by(|a, b| a.1.cmp(&b.1));
                        println!("Select a rule:");
                        for (i, (_, text)) in sorted.iter().enumerate() {
                            println!("{:>3}. {}", i, text);
                        }
                        print!("  > ");
                        io::stdout().flush().ok();
                        if let Some(Ok(rule_choice)) = lines.next() {
                            if let Ok(rule_index) = rule_choice.trim().parse::<usize>() {
                                if let Some(&(original_index, _)) = sorted.get(rule_index) {
                                    driver.expand(index, original_index).ok();
                                }
                            }
                        }
                    }
                    Err(err) => println!("{}", err),
                },
                Err(_) => println!("    Invalid input."),
            },
        }
    }

    let derivation_path = path_with_suffix(original_path, "interactive_derivation");
    write_output(&derivation_path, &driver.tree().string_derivation())
}
