use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use hemo_core::config::{Config, Settings};
use hemo_core::error::Result as HemoResult;
use hemo_core::logging::init_logging;
use hemo_core::report::extract_parameters;
use hemo_rag::{
    Chatbot, MessageGateway, MessageRouter, OpenAiChat, PatientRegistry, PhoneNumber, ReportAnalyzer, RetrievalEngine,
};

const USAGE: &str = "Usage: hemo <command> [args...]

Commands:
  context \"<question>\"            show the retrieved context and its source
  ask \"<question>\"                answer a question with retrieved context
  analyze <report.txt> [--params-only]
                                  extract blood parameters and assess them
  route <sender> \"<message>\"      route an inbound chat message
  register <number>               send the welcome message to a new patient";

/// Prints outbound messages instead of delivering them.
struct ConsoleGateway;

impl MessageGateway for ConsoleGateway {
    fn send(&self, to: &PhoneNumber, body: &str) -> HemoResult<()> {
        println!("-> {}: {}", to.whatsapp_address(), body);
        Ok(())
    }
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn required(args: &[String], i: usize, what: &str) -> anyhow::Result<String> {
    args.get(i).cloned().with_context(|| format!("missing {what}\n\n{USAGE}"))
}

fn engine(settings: &Settings) -> anyhow::Result<Arc<RetrievalEngine>> {
    let engine = RetrievalEngine::from_settings(settings, Path::new("."))?;
    engine.bootstrap();
    Ok(Arc::new(engine))
}

fn chatbot(settings: &Settings) -> anyhow::Result<Chatbot> {
    let generator = OpenAiChat::for_chat(&settings.llm)?;
    Ok(Chatbot::new(engine(settings)?, Arc::new(generator)))
}

fn main() -> anyhow::Result<()> {
    init_logging("info");
    let config = Config::load()?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "context" => {
            let question = required(&args, 0, "question")?;
            let ctx = engine(&settings)?.get_relevant_context(&question);
            println!("source: {}", ctx.source);
            for skipped in &ctx.skipped {
                println!("skipped {}: {:?}", skipped.tier, skipped.reason);
            }
            println!("\n{}", ctx.text);
        }
        "ask" => {
            let question = required(&args, 0, "question")?;
            let answer = chatbot(&settings)?.answer(&question)?;
            println!("{}", answer.answer);
            tracing::debug!(source = %answer.context.source, "answer context");
        }
        "analyze" => {
            let path = required(&args, 0, "report path")?;
            let text = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
            let params_only = args.iter().any(|a| a == "--params-only");
            if params_only {
                println!("{}", serde_json::to_string_pretty(&extract_parameters(&text))?);
                return Ok(());
            }
            let analyzer = ReportAnalyzer::new(Arc::new(OpenAiChat::for_analysis(&settings.llm)?));
            let assessment = analyzer.analyze_text(&text)?;
            for (label, value) in assessment.parameters.fields() {
                match value {
                    Some(v) => println!("{label:<18} {v}"),
                    None => println!("{label:<18} N/A"),
                }
            }
            if let Some(category) = assessment.category {
                println!("\ncategory: {category}");
            }
            println!("\n{}", assessment.text);
        }
        "route" => {
            let sender = required(&args, 0, "sender number")?;
            let body = required(&args, 1, "message")?;
            let doctor = settings.messaging.doctor_number.as_deref().map(PhoneNumber::parse).transpose()?;
            let router = MessageRouter::new(Arc::new(chatbot(&settings)?), Arc::new(ConsoleGateway), doctor);
            let routed = router.handle(&sender, &body);
            tracing::info!(action = ?routed.action, "message routed");
            println!("{}", routed.reply);
        }
        "register" => {
            let number = required(&args, 0, "patient number")?;
            let registry = PatientRegistry::new(Arc::new(ConsoleGateway));
            let patient = registry
                .register(&number)
                .with_context(|| format!("failed to register {number}"))?;
            println!("Registered patient {patient}");
        }
        _ => {
            eprintln!("Unknown command: {cmd}\n\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
