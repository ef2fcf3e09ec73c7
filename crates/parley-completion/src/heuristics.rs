// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply-text heuristics for confidence and handoff flagging.
//!
//! The confidence score is derived from keyword matching on the generated
//! reply itself -- it is NOT a calibrated model probability and is
//! meaningful only as an escalation trigger inside this system. The
//! behavior (score below 0.6 escalates) is part of the contract; the score
//! itself is not.

/// Phrases indicating the assistant is unsure of its own answer.
const UNCERTAINTY_MARKERS: &[&str] = &[
    "i'm not sure",
    "i am not sure",
    "i don't know",
    "i do not know",
    "i can't help",
    "i cannot help",
    "i'm unable",
    "i am unable",
    "you may want to contact",
    "please contact support",
];

/// Phrases indicating the assistant itself suggested a human take over.
const HANDOFF_MARKERS: &[&str] = &[
    "connect you with a human",
    "connect you with an agent",
    "a member of our team",
    "one of our agents",
    "human agent will",
];

/// Score a generated reply. Starts at 0.9 and loses 0.25 per distinct
/// uncertainty marker found, clamped to [0, 1].
pub fn score_confidence(reply: &str) -> f64 {
    let lower = reply.to_lowercase();
    let hits = UNCERTAINTY_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count();
    (0.9 - 0.25 * hits as f64).clamp(0.0, 1.0)
}

/// True when the reply itself promises or suggests a human handoff.
pub fn suggests_handoff(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    HANDOFF_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_reply_scores_high() {
        let score = score_confidence("Your order shipped yesterday and arrives Friday.");
        assert!(score >= 0.6, "got {score}");
    }

    #[test]
    fn uncertain_reply_drops_below_threshold() {
        let score =
            score_confidence("I'm not sure about that. I don't know the shipping status.");
        assert!(score < 0.6, "got {score}");
    }

    #[test]
    fn score_is_clamped() {
        let very_unsure = "I'm not sure. I don't know. I can't help. \
                           Please contact support. I'm unable to say.";
        let score = score_confidence(very_unsure);
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn handoff_phrases_are_detected() {
        assert!(suggests_handoff(
            "Let me connect you with a human who can help."
        ));
        assert!(!suggests_handoff("Your refund was processed."));
    }
}
