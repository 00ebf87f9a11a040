//! Interactive terminal surface over the listing and generation actions.

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::io::Write;

use crate::commands::generation::{generate_description, GenerateOutcome};
use crate::commands::listing::{
    back_to_results, find_listing, results_view, select_event, ResultsView, NOT_SEARCHED_MESSAGE,
    NO_MATCHES_MESSAGE,
};
use crate::error::{AppError, AppResult};
use crate::services::generation::SUPPORTED_MODELS;
use crate::services::{Clock, DatasetService, Page, Session, TextGenerator};

const PROMPT: &str = "eventbnb> ";
const NO_GENERATED_TEXT: &str = "No generated text yet. Select an event and run generate.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Find(String),
    Pick(usize),
    Generate,
    Key(String),
    Model(String),
    Back,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Exit,
}

pub fn parse_command(line: &str) -> AppResult<ReplCommand> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let command = match cmd.to_ascii_lowercase().as_str() {
        "find" | "f" => ReplCommand::Find(rest.to_string()),
        "pick" | "p" => {
            let index = rest
                .parse::<usize>()
                .map_err(|_| AppError::Validation(format!("'{}' is not a row number", rest)))?;
            ReplCommand::Pick(index)
        }
        "generate" | "gen" | "g" => ReplCommand::Generate,
        "key" => ReplCommand::Key(rest.to_string()),
        "model" => ReplCommand::Model(rest.to_string()),
        "back" | "b" => ReplCommand::Back,
        "show" | "s" => ReplCommand::Show,
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => {
            return Err(AppError::Validation(format!(
                "Unknown command: {}. Type help for available commands",
                other
            )))
        }
    };

    Ok(command)
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers)];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(rows.iter().map(|row| format_row(row)));
    lines.join("\n")
}

/// The action handlers plus the credential and model the user picked.
pub struct Actions<G, C> {
    pub session: Session,
    pub dataset: DatasetService,
    generator: G,
    clock: C,
    api_key: String,
    model: String,
}

impl<G: TextGenerator, C: Clock> Actions<G, C> {
    pub fn new(session: Session, dataset: DatasetService, generator: G, clock: C, model: impl Into<String>) -> Self {
        Self {
            session,
            dataset,
            generator,
            clock,
            api_key: String::new(),
            model: model.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.unwrap_or_default().trim().to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn render_current(&self, out: &mut impl Write) -> AppResult<()> {
        match self.session.page {
            Page::Results => self.render_results(out),
            Page::Generated => self.render_generated(out),
        }
    }

    fn render_results(&self, out: &mut impl Write) -> AppResult<()> {
        match results_view(&self.session, &self.dataset)? {
            ResultsView::NotSearched => writeln!(out, "{}", NOT_SEARCHED_MESSAGE)?,
            ResultsView::NoMatches => writeln!(out, "{}", NO_MATCHES_MESSAGE)?,
            ResultsView::Table { headers, rows, options } => {
                writeln!(out, "Events near listing {}:", self.session.last_lookup_id)?;
                writeln!(out, "{}", render_table(&headers, &rows))?;
                writeln!(out)?;
                for option in &options {
                    writeln!(out, "  {}", option)?;
                }
                if let Some(selected) = self.selected_label() {
                    writeln!(out, "Selected {}", selected)?;
                }
                writeln!(out, "Current description: {}", self.session.current_description)?;
            }
        }
        Ok(())
    }

    fn render_generated(&self, out: &mut impl Write) -> AppResult<()> {
        match self.session.generated_text.as_deref() {
            Some(text) if !text.is_empty() => {
                writeln!(out, "Event-aware description:")?;
                writeln!(out, "{}", text)?;
            }
            _ => {
                tracing::warn!("generated view shown without output");
                writeln!(out, "{}", NO_GENERATED_TEXT)?;
            }
        }
        writeln!(out, "(type back to return to the results)")?;
        Ok(())
    }

    fn selected_label(&self) -> Option<String> {
        let selected = self.session.selected.as_ref()?;
        self.session
            .lookup
            .matches()
            .iter()
            .position(|event| event == selected)
            .map(|index| selected.option_label(index))
    }

    pub async fn execute(&mut self, command: ReplCommand, out: &mut impl Write) -> AppResult<ControlFlow> {
        match command {
            ReplCommand::Find(raw_id) => {
                let response = find_listing(&mut self.session, &self.dataset, &raw_id)?;
                if response.data > 0 {
                    select_event(&mut self.session, 0)?;
                    writeln!(out, "Found {} event(s).", response.data)?;
                }
                self.render_results(out)?;
            }
            ReplCommand::Pick(index) => {
                let response = select_event(&mut self.session, index)?;
                if let Some(message) = response.message {
                    writeln!(out, "{}", message)?;
                }
            }
            ReplCommand::Generate => {
                let response = generate_description(
                    &mut self.session,
                    &self.generator,
                    &self.clock,
                    &self.api_key,
                    &self.model,
                )
                .await?;

                match response.data {
                    GenerateOutcome::Generated { .. } => self.render_generated(out)?,
                    GenerateOutcome::Busy | GenerateOutcome::CoolingDown { .. } => {}
                }
                if let Some(message) = response.message {
                    writeln!(out, "{}", message)?;
                }
            }
            ReplCommand::Key(api_key) => {
                self.api_key = api_key.trim().to_string();
                writeln!(out, "API key set.")?;
            }
            ReplCommand::Model(model) => {
                if !SUPPORTED_MODELS.contains(&model.as_str()) {
                    return Err(AppError::Validation(format!(
                        "Unsupported model '{}'. Choose one of: {}",
                        model,
                        SUPPORTED_MODELS.join(", ")
                    )));
                }
                self.model = model;
                writeln!(out, "Model set to {}.", self.model)?;
            }
            ReplCommand::Back => {
                back_to_results(&mut self.session)?;
                self.render_results(out)?;
            }
            ReplCommand::Show => self.render_current(out)?,
            ReplCommand::Help => print_help(out)?,
            ReplCommand::Quit => return Ok(ControlFlow::Exit),
        }

        Ok(ControlFlow::Continue)
    }
}

fn print_help(out: &mut impl Write) -> AppResult<()> {
    writeln!(out)?;
    writeln!(out, "Available Commands")?;
    writeln!(out, "{}", "-".repeat(40))?;
    writeln!(out, "  find <listing_id>  - Look up events near a listing")?;
    writeln!(out, "  pick <n>           - Select a matched event row")?;
    writeln!(out, "  generate           - Rewrite the description around the selected event")?;
    writeln!(out, "  key <api-key>      - Set the Gemini API key")?;
    writeln!(out, "  model <name>       - Choose a model ({})", SUPPORTED_MODELS.join(", "))?;
    writeln!(out, "  back               - Return to the results")?;
    writeln!(out, "  show               - Show the current view")?;
    writeln!(out, "  help               - Show this help")?;
    writeln!(out, "  quit               - Exit")?;
    writeln!(out)?;
    Ok(())
}

/// REPL state and configuration.
pub struct Repl<G, C> {
    actions: Actions<G, C>,
    editor: Editor<(), DefaultHistory>,
}

impl<G: TextGenerator, C: Clock> Repl<G, C> {
    pub fn new(actions: Actions<G, C>) -> AppResult<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config).map_err(|e| AppError::Io(e.to_string()))?;

        Ok(Self { actions, editor })
    }

    pub async fn run(&mut self) -> AppResult<()> {
        let mut stdout = std::io::stdout();

        println!("EventBnb: event-aware listing descriptions");
        println!("{}", "-".repeat(40));
        println!("Type help for commands, Ctrl+D to exit.");
        println!();
        self.actions.render_current(&mut stdout)?;

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    let command = match parse_command(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    };

                    match self.actions.execute(command, &mut stdout).await {
                        Ok(ControlFlow::Continue) => {}
                        Ok(ControlFlow::Exit) => break,
                        Err(e) => eprintln!("{}", e),
                    }
                    stdout.flush()?;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("(Interrupted - type quit to exit)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gate::tests::ManualClock;
    use crate::services::generation::tests::ScriptedGenerator;
    use std::time::Duration;

    const SAMPLE_CSV: &str = "\
listing_id,event_name,event_type,event_date,venue_name,distance_km,days_until_event,current_price,suggested_price,description
27926486,Jazz Night,concert,2025-07-04,Blue Hall,1.2,10,120,150,Cozy loft near the river.
27926486,Food Fest,festival,2025-07-12,Harbor Park,3.5,18,120,140,Cozy loft near the river.
";

    fn actions(reply: &str) -> Actions<ScriptedGenerator, ManualClock> {
        let dataset = DatasetService::from_reader(SAMPLE_CSV.as_bytes()).expect("Failed to load dataset");
        Actions::new(
            Session::new(Duration::from_secs(8)),
            dataset,
            ScriptedGenerator::replying(reply),
            ManualClock::new(),
            "gemini-2.5-flash",
        )
    }

    async fn run(actions: &mut Actions<ScriptedGenerator, ManualClock>, line: &str) -> AppResult<String> {
        let mut out = Vec::new();
        actions.execute(parse_command(line)?, &mut out).await?;
        Ok(String::from_utf8(out).expect("utf8 output"))
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_parse_commands() {
            assert_eq!(parse_command("find 27926486").unwrap(), ReplCommand::Find("27926486".to_string()));
            assert_eq!(parse_command("  pick   1 ").unwrap(), ReplCommand::Pick(1));
            assert_eq!(parse_command("GEN").unwrap(), ReplCommand::Generate);
            assert_eq!(parse_command("find").unwrap(), ReplCommand::Find(String::new()));
            assert_eq!(parse_command("q").unwrap(), ReplCommand::Quit);
        }

        #[test]
        fn test_parse_rejects_bad_input() {
            assert!(matches!(parse_command("pick x"), Err(AppError::Validation(_))));
            assert!(matches!(parse_command("dance"), Err(AppError::Validation(_))));
        }

        #[test]
        fn test_render_table_aligns_columns() {
            let table = render_table(
                &["name".to_string(), "km".to_string()],
                &[vec!["Jazz Night".to_string(), "1.2".to_string()]],
            );
            let lines: Vec<&str> = table.lines().collect();
            assert_eq!(lines[0], "name       | km");
            assert_eq!(lines[1], "-----------+----");
            assert_eq!(lines[2], "Jazz Night | 1.2");
        }
    }

    mod session_flow {
        use super::*;

        #[tokio::test]
        async fn test_show_before_search_lists_example_ids() {
            let mut actions = actions("unused");
            let output = run(&mut actions, "show").await.expect("show");
            assert!(output.contains("27926486, 43546204, 45491410"));
        }

        #[tokio::test]
        async fn test_find_selects_first_row_and_renders_table() {
            let mut actions = actions("unused");
            let output = run(&mut actions, "find 27926486").await.expect("find");

            assert!(output.contains("Found 2 event(s)."));
            assert!(output.contains("days_until"));
            assert!(output.contains("suggested_price_for_event"));
            assert!(output.contains("1: Food Fest | 2025-07-12 | Harbor Park"));
            assert!(output.contains("Selected 0: Jazz Night | 2025-07-04 | Blue Hall"));
            assert_eq!(
                actions.session.selected.as_ref().and_then(|e| e.event_name.as_deref()),
                Some("Jazz Night")
            );
        }

        #[tokio::test]
        async fn test_generate_flow_and_back() {
            let mut actions = actions("A loft two stops from the jazz.").with_api_key(Some("  AIzaTestKey0000 ".to_string()));
            run(&mut actions, "find 27926486").await.expect("find");
            run(&mut actions, "pick 1").await.expect("pick");

            let output = run(&mut actions, "generate").await.expect("generate");
            assert!(output.contains("A loft two stops from the jazz."));
            assert!(output.contains("Gemini calls this session: 1"));
            assert_eq!(actions.session.page, Page::Generated);

            let output = run(&mut actions, "generate").await.expect("cooldown");
            assert!(output.contains("Please wait 8s before generating again."));

            let output = run(&mut actions, "back").await.expect("back");
            assert!(output.contains("Selected 1: Food Fest"));
            assert_eq!(actions.session.page, Page::Results);
        }

        #[tokio::test]
        async fn test_generate_without_key_is_an_error_not_an_exit() {
            let mut actions = actions("unused");
            run(&mut actions, "find 27926486").await.expect("find");

            let err = run(&mut actions, "generate").await.expect_err("should fail");
            assert!(matches!(err, AppError::Precondition(_)));

            run(&mut actions, "key AIzaTestKey0000").await.expect("key");
            run(&mut actions, "generate").await.expect("generate");
        }

        #[tokio::test]
        async fn test_invalid_id_keeps_previous_results() {
            let mut actions = actions("unused");
            run(&mut actions, "find 27926486").await.expect("find");

            let err = run(&mut actions, "find bad id!").await.expect_err("should fail");
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(actions.session.lookup.matches().len(), 2);
        }

        #[tokio::test]
        async fn test_model_must_be_supported() {
            let mut actions = actions("unused");
            assert!(run(&mut actions, "model gpt-4").await.is_err());
            assert_eq!(actions.model(), "gemini-2.5-flash");
            run(&mut actions, "model gemini-2.5-flash").await.expect("model");
        }

        #[tokio::test]
        async fn test_generated_view_without_output_warns() {
            let mut actions = actions("unused");
            actions.session.page = Page::Generated;
            let output = run(&mut actions, "show").await.expect("show");
            assert!(output.contains(NO_GENERATED_TEXT));
        }

        #[tokio::test]
        async fn test_quit_exits() {
            let mut actions = actions("unused");
            let mut out = Vec::new();
            let flow = actions.execute(ReplCommand::Quit, &mut out).await.expect("quit");
            assert_eq!(flow, ControlFlow::Exit);
        }
    }
}
