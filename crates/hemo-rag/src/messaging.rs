//! Routing of inbound chat messages between patients, the doctor and the chatbot.
//!
//! Delivery is abstracted behind [`MessageGateway`]; no transport lives here.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, Mutex};

use hemo_core::error::{Error, Result};
use regex::Regex;
use serde::Serialize;

use crate::chatbot::Chatbot;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").expect("valid phone regex"));

const WHATSAPP_PREFIX: &str = "whatsapp:";
const DOCTOR_PREFIX: &str = "doctor:";

/// Sent to a patient when they are registered.
pub const WELCOME_MESSAGE: &str = "Welcome to the Hemoglobinopathy Analysis System!

You can:
1. Ask questions about hemoglobinopathies
2. Contact your doctor by starting your message with 'doctor:'
3. Get immediate AI assistance for medical queries
4. Access your test results and medical history

Reply with any question to get started!

For technical support, please contact our help desk.";

/// E.164-style number: `+` followed by 10 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Accepts an optional `whatsapp:` prefix and a missing leading `+`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix(WHATSAPP_PREFIX).unwrap_or(trimmed).trim();
        let number = if bare.starts_with('+') { bare.to_string() } else { format!("+{bare}") };
        if PHONE_RE.is_match(&number) {
            Ok(Self(number))
        } else {
            Err(Error::InvalidPhoneNumber(format!(
                "{raw:?}: must start with + and contain 10-15 digits"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn whatsapp_address(&self) -> String {
        format!("{WHATSAPP_PREFIX}{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Outbound message delivery.
pub trait MessageGateway: Send + Sync {
    fn send(&self, to: &PhoneNumber, body: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RouteAction {
    ForwardedToDoctor,
    ForwardFailed,
    RelayedToPatient(PhoneNumber),
    RelayFailed,
    InvalidPatientNumber,
    Answered,
    AnswerFailed,
}

/// What happened to an inbound message and the text to reply to its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedReply {
    pub action: RouteAction,
    pub reply: String,
}

impl RoutedReply {
    fn new(action: RouteAction, reply: impl Into<String>) -> Self {
        Self { action, reply: reply.into() }
    }
}

pub struct MessageRouter {
    chatbot: Arc<Chatbot>,
    gateway: Arc<dyn MessageGateway>,
    doctor: Option<PhoneNumber>,
}

impl MessageRouter {
    pub fn new(chatbot: Arc<Chatbot>, gateway: Arc<dyn MessageGateway>, doctor: Option<PhoneNumber>) -> Self {
        if doctor.is_none() {
            tracing::warn!("no doctor number configured, doctor forwarding disabled");
        }
        Self { chatbot, gateway, doctor }
    }

    pub fn handle(&self, sender: &str, body: &str) -> RoutedReply {
        let sender_display = sender.trim().strip_prefix(WHATSAPP_PREFIX).unwrap_or(sender.trim());
        let sender_number = PhoneNumber::parse(sender).ok();
        tracing::info!(sender = sender_display, "inbound message");

        if let Some(rest) = strip_prefix_ignore_case(body, DOCTOR_PREFIX) {
            return self.forward_to_doctor(sender_display, rest.trim());
        }
        let from_doctor = self.doctor.is_some() && sender_number.as_ref() == self.doctor.as_ref();
        if from_doctor {
            if let Some((target, text)) = body.split_once(':') {
                return self.relay_to_patient(target, text.trim());
            }
        }
        self.answer(body)
    }

    fn forward_to_doctor(&self, sender: &str, text: &str) -> RoutedReply {
        let Some(doctor) = &self.doctor else {
            return RoutedReply::new(
                RouteAction::ForwardFailed,
                "Sorry, couldn't forward your message to the doctor. Please try again later.",
            );
        };
        match self.gateway.send(doctor, &format!("Patient ({sender}): {text}")) {
            Ok(()) => RoutedReply::new(RouteAction::ForwardedToDoctor, "Message forwarded to doctor. They will respond soon."),
            Err(e) => {
                tracing::warn!(error = %e, "forwarding to doctor failed");
                RoutedReply::new(
                    RouteAction::ForwardFailed,
                    "Sorry, couldn't forward your message to the doctor. Please try again later.",
                )
            }
        }
    }

    fn relay_to_patient(&self, target: &str, text: &str) -> RoutedReply {
        let patient = match PhoneNumber::parse(target) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "doctor reply has an invalid patient number");
                return RoutedReply::new(
                    RouteAction::InvalidPatientNumber,
                    "Invalid phone number format. Please use format: +1234567890: your message",
                );
            }
        };
        match self.gateway.send(&patient, &format!("Doctor: {text}")) {
            Ok(()) => RoutedReply::new(RouteAction::RelayedToPatient(patient), "Response sent to patient."),
            Err(e) => {
                tracing::warn!(error = %e, patient = %patient, "relay to patient failed");
                RoutedReply::new(RouteAction::RelayFailed, "Failed to send response to patient.")
            }
        }
    }

    fn answer(&self, question: &str) -> RoutedReply {
        match self.chatbot.answer(question) {
            Ok(answer) => RoutedReply::new(RouteAction::Answered, answer.answer),
            Err(e) => {
                tracing::warn!(error = %e, "chatbot could not answer");
                RoutedReply::new(
                    RouteAction::AnswerFailed,
                    "I'm sorry, I couldn't process your request. Please try again later.",
                )
            }
        }
    }
}

/// Patients who have received the welcome message.
pub struct PatientRegistry {
    gateway: Arc<dyn MessageGateway>,
    patients: Mutex<BTreeSet<PhoneNumber>>,
}

impl PatientRegistry {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway, patients: Mutex::new(BTreeSet::new()) }
    }

    /// Validate `raw`, send the welcome message and record the number.
    /// Nothing is recorded when delivery fails.
    pub fn register(&self, raw: &str) -> Result<PhoneNumber> {
        let number = PhoneNumber::parse(raw)?;
        self.gateway.send(&number, WELCOME_MESSAGE).inspect_err(|e| {
            tracing::warn!(error = %e, patient = %number, "welcome message not delivered");
        })?;
        self.patients.lock().unwrap_or_else(|e| e.into_inner()).insert(number.clone());
        tracing::info!(patient = %number, "patient registered");
        Ok(number)
    }

    pub fn is_registered(&self, number: &PhoneNumber) -> bool {
        self.patients.lock().unwrap_or_else(|e| e.into_inner()).contains(number)
    }

    /// Registered numbers in sorted order.
    pub fn patients(&self) -> Vec<PhoneNumber> {
        self.patients.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(PhoneNumber::parse("+2347037819697").unwrap().as_str(), "+2347037819697");
        assert_eq!(PhoneNumber::parse(" 2347037819697 ").unwrap().as_str(), "+2347037819697");
        assert_eq!(PhoneNumber::parse("whatsapp:+14155238886").unwrap().as_str(), "+14155238886");
        assert_eq!(PhoneNumber::parse("+14155238886").unwrap().whatsapp_address(), "whatsapp:+14155238886");
    }

    #[test]
    fn phone_numbers_outside_10_to_15_digits_are_rejected() {
        assert!(PhoneNumber::parse("+123456789").is_err());
        assert!(PhoneNumber::parse("+1234567890123456").is_err());
        assert!(PhoneNumber::parse("+1415-523-8886").is_err());
        assert!(matches!("".parse::<PhoneNumber>(), Err(Error::InvalidPhoneNumber(_))));
    }

    #[test]
    fn doctor_prefix_is_case_insensitive() {
        assert_eq!(strip_prefix_ignore_case("Doctor: help", "doctor:"), Some(" help"));
        assert_eq!(strip_prefix_ignore_case("doc", "doctor:"), None);
        assert_eq!(strip_prefix_ignore_case("é doctor:", "doctor:"), None);
    }
}
