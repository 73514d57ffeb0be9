//! Keyword heuristics that turn raw posts into labeled complaints.

/// Keywords that mark a post as a complaint.
pub const COMPLAINT_KEYWORDS: &[&str] = &[
    "complaint",
    "problem",
    "issue",
    "failed",
    "not working",
    "error",
    "fraud",
    "scam",
    "stolen",
    "lost",
    "not received",
    "deducted",
    "failed transaction",
    "refund",
    "customer care",
    "help",
    "support",
    "cheat",
    "thief",
    "theft",
    "stuck",
    "pending",
    "delay",
];

/// Case-insensitive substring match against the complaint keyword list.
pub fn is_complaint(text: &str) -> bool {
    let text = text.to_lowercase();
    COMPLAINT_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// Complaint category, derived from post text. The first matching rule wins,
/// so a post about a failed transaction that also mentions fraud stays a
/// `FailedTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    FailedTransaction,
    MoneyNotReceived,
    UnauthorizedDeduction,
    PoorCustomerService,
    SystemNetworkIssue,
    HighCharges,
    General,
}

impl Category {
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if any(&["failed transaction", "transaction failed", "not completed"]) {
            Category::FailedTransaction
        } else if any(&["not received", "money not", "has not been received"]) {
            Category::MoneyNotReceived
        } else if any(&["deducted", "taken", "stolen", "fraud"]) {
            Category::UnauthorizedDeduction
        } else if any(&["customer care", "support", "help", "service"]) {
            Category::PoorCustomerService
        } else if any(&["network", "not working", "down", "error"]) {
            Category::SystemNetworkIssue
        } else if any(&["charges", "fees", "cost", "expensive"]) {
            Category::HighCharges
        } else {
            Category::General
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::FailedTransaction => "Failed Transaction",
            Category::MoneyNotReceived => "Money Not Received",
            Category::UnauthorizedDeduction => "Unauthorized Deduction",
            Category::PoorCustomerService => "Poor Customer Service",
            Category::SystemNetworkIssue => "System/Network Issue",
            Category::HighCharges => "High Charges/Fees",
            Category::General => "General Complaint",
        }
    }
}

/// Mobile network mentioned in a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Airtel,
    Mtn,
    Africell,
    Utl,
    Unknown,
}

impl Network {
    pub fn detect(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("airtel") {
            Network::Airtel
        } else if text.contains("mtn") || text.contains("momo") {
            Network::Mtn
        } else if text.contains("africell") {
            Network::Africell
        } else if text.contains("utl") {
            Network::Utl
        } else {
            Network::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Network::Airtel => "Airtel",
            Network::Mtn => "MTN",
            Network::Africell => "Africell",
            Network::Utl => "UTL",
            Network::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_flags_a_complaint() {
        assert!(is_complaint(
            "My transaction FAILED but the money was deducted, please help"
        ));
        assert!(is_complaint("momo has been pending since morning"));
    }

    #[test]
    fn text_without_keywords_is_not_a_complaint() {
        assert!(!is_complaint("Just paid school fees with mobile money, so convenient"));
        assert!(!is_complaint(""));
    }

    #[test]
    fn categories_match_expected_labels() {
        let cases = [
            ("my transaction failed yesterday", Category::FailedTransaction),
            ("the money has not been received", Category::MoneyNotReceived),
            ("500k was deducted without my consent", Category::UnauthorizedDeduction),
            ("customer care never picks up", Category::PoorCustomerService),
            ("mobile money is not working again", Category::SystemNetworkIssue),
            ("these withdrawal charges are too expensive", Category::HighCharges),
            ("I am so disappointed", Category::General),
        ];
        for (text, expected) in cases {
            assert_eq!(Category::classify(text), expected, "text: {text}");
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        // mentions fraud too, but the failed-transaction rule is checked first
        let text = "transaction failed, this is fraud";
        assert_eq!(Category::classify(text), Category::FailedTransaction);
    }

    #[test]
    fn network_detection() {
        assert_eq!(Network::detect("Airtel Money swallowed my cash"), Network::Airtel);
        assert_eq!(Network::detect("mtn momo is down"), Network::Mtn);
        assert_eq!(Network::detect("momo agent refused"), Network::Mtn);
        assert_eq!(Network::detect("africell line issues"), Network::Africell);
        assert_eq!(Network::detect("utl never works"), Network::Utl);
        assert_eq!(Network::detect("my provider is useless"), Network::Unknown);
    }

    #[test]
    fn airtel_takes_precedence_over_mtn() {
        assert_eq!(
            Network::detect("switched from airtel money to mtn momo"),
            Network::Airtel
        );
    }
}
