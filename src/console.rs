//! Interactive question loop over a line-oriented reader and writer.

use crate::assistant::{AssistantError, ResearchAssistant};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const RULE: &str = "==================================================";

/// Something that can answer a question about the paper.
#[async_trait]
pub trait QueryPipeline: Send {
    /// Produce an answer for `query`.
    async fn answer(&mut self, query: &str) -> Result<String, AssistantError>;
}

#[async_trait]
impl QueryPipeline for ResearchAssistant {
    async fn answer(&mut self, query: &str) -> Result<String, AssistantError> {
        self.query_research_paper(query).await
    }
}

/// Interpretation of one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Leave the loop.
    Exit,
    /// Nothing to do; prompt again.
    Skip,
    /// Question to answer.
    Query(String),
}

impl ConsoleCommand {
    /// Classify a raw input line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if is_exit_command(trimmed) {
            Self::Exit
        } else if trimmed.is_empty() {
            Self::Skip
        } else {
            Self::Query(trimmed.to_string())
        }
    }
}

/// Whether `input` asks to leave the loop (`exit`, `quit`, or `q`, any case).
pub fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    matches!(normalized.as_str(), "exit" | "quit" | "q")
}

/// Prompt for questions until an exit command or end of input.
///
/// A failed question is reported on `writer` and the loop keeps going.
pub async fn run_console<P, R, W>(pipeline: &mut P, reader: R, mut writer: W) -> std::io::Result<()>
where
    P: QueryPipeline + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(
            b"\nAgentic RAG System Ready!\n\
Ask questions about the research paper. Type 'exit' to quit.\n",
        )
        .await?;

    let mut lines = reader.lines();
    loop {
        writer.write_all(b"\nYour question: ").await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            tracing::debug!("Input closed");
            break;
        };

        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Exit => {
                writer.write_all(b"\nGoodbye!\n").await?;
                break;
            }
            ConsoleCommand::Skip => continue,
            ConsoleCommand::Query(query) => match pipeline.answer(&query).await {
                Ok(answer) => {
                    let block = format!("\n{RULE}\nAnswer:\n{RULE}\n{answer}\n");
                    writer.write_all(block.as_bytes()).await?;
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Query failed");
                    writer
                        .write_all(format!("\nError: {error}\n").as_bytes())
                        .await?;
                }
            },
        }
    }
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CrewError;
    use crate::agents::executor::StageError;
    use tokio::io::BufReader;

    #[derive(Default)]
    struct EchoPipeline {
        seen: Vec<String>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl QueryPipeline for EchoPipeline {
        async fn answer(&mut self, query: &str) -> Result<String, AssistantError> {
            self.seen.push(query.to_string());
            if self.fail_on == Some(query) {
                return Err(AssistantError::Crew(CrewError::Stage(
                    StageError::EmptyAnswer {
                        role: "Q&A Specialist",
                    },
                )));
            }
            Ok(format!("echo: {query}"))
        }
    }

    async fn drive(pipeline: &mut EchoPipeline, input: &str) -> String {
        let mut output = Vec::new();
        run_console(pipeline, BufReader::new(input.as_bytes()), &mut output)
            .await
            .expect("console");
        String::from_utf8(output).expect("utf8")
    }

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["exit", "QUIT", " q ", "Exit\n"] {
            assert!(is_exit_command(word), "{word:?}");
        }
        assert!(!is_exit_command("question"));
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Skip);
        assert_eq!(
            ConsoleCommand::parse("  What is new?  "),
            ConsoleCommand::Query("What is new?".into())
        );
    }

    #[tokio::test]
    async fn exit_stops_before_pipeline() {
        for input in ["exit\n", "QUIT\n", " q \n"] {
            let mut pipeline = EchoPipeline::default();
            let output = drive(&mut pipeline, &format!("{input}never asked\n")).await;
            assert!(pipeline.seen.is_empty());
            assert!(output.contains("Goodbye!"));
        }
    }

    #[tokio::test]
    async fn blank_lines_reprompt_and_answers_are_printed() {
        let mut pipeline = EchoPipeline::default();
        let output = drive(&mut pipeline, "\n   \nWhat is the method?\nexit\n").await;

        assert_eq!(pipeline.seen, vec!["What is the method?"]);
        assert_eq!(output.matches("Your question: ").count(), 4);
        assert!(output.contains("Answer:\n"));
        assert!(output.contains("echo: What is the method?"));
    }

    #[tokio::test]
    async fn errors_are_reported_and_loop_continues() {
        let mut pipeline = EchoPipeline {
            fail_on: Some("bad"),
            ..EchoPipeline::default()
        };
        let output = drive(&mut pipeline, "bad\ngood\n").await;

        assert_eq!(pipeline.seen, vec!["bad", "good"]);
        assert!(output.contains("Error: Crew execution failed"));
        assert!(output.contains("echo: good"));
    }

    #[tokio::test]
    async fn end_of_input_ends_the_loop() {
        let mut pipeline = EchoPipeline::default();
        let output = drive(&mut pipeline, "").await;
        assert!(pipeline.seen.is_empty());
        assert!(!output.contains("Goodbye!"));
    }
}
