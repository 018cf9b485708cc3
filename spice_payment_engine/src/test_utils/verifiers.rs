//! Scripted payment verifiers for exercising the verification chain.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;

use crate::{
    db_types::Order,
    traits::{PaymentVerifier, VerifierError},
};

/// What a [`ScriptedVerifier`] answers for a given order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Paid,
    Unpaid,
    Fail,
}

/// Answers from a fixed table, keyed by order NSU. Unknown orders get the default answer.
#[derive(Debug, Clone)]
pub struct ScriptedVerifier {
    name: String,
    answers: HashMap<String, Answer>,
    default: Answer,
    calls: Arc<AtomicUsize>,
}

impl ScriptedVerifier {
    pub fn new(name: &str, default: Answer) -> Self {
        Self { name: name.to_string(), answers: HashMap::new(), default, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn answer(mut self, order_nsu: &str, answer: Answer) -> Self {
        self.answers.insert(order_nsu.to_string(), answer);
        self
    }

    /// A handle to the number of times this verifier has been asked.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PaymentVerifier for ScriptedVerifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_payment(&self, order: &Order) -> Result<bool, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(order.order_nsu.as_str()).copied().unwrap_or(self.default) {
            Answer::Paid => Ok(true),
            Answer::Unpaid => Ok(false),
            Answer::Fail => Err(VerifierError::Unavailable(format!("{} is down", self.name))),
        }
    }
}
