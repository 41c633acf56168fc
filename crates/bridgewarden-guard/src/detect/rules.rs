//! English detection rules and the obfuscation fingerprint table.
//!
//! Each rule carries the reason code it contributes and the minimum
//! profile tier at which it fires. The rule set is part of the versioned
//! policy: compiled once into immutable statics, never mutated.

use crate::decision::Tier;
use crate::types::ReasonCode;
use regex::Regex;
use std::sync::LazyLock;

/// One compiled detection rule.
pub(crate) struct DetectionRule {
    /// Reason code contributed on match.
    pub code: ReasonCode,
    /// Minimum tier at which the rule fires.
    pub tier: Tier,
    /// Compiled pattern, matched against the sanitized text.
    pub pattern: Regex,
}

fn rule(code: ReasonCode, tier: Tier, pattern: &str) -> DetectionRule {
    DetectionRule {
        code,
        tier,
        pattern: Regex::new(pattern).unwrap(),
    }
}

/// The Class-A English rule table.
pub(crate) static ENGLISH_RULES: LazyLock<Vec<DetectionRule>> = LazyLock::new(|| {
    vec![
        // ============================================================
        // EVERY PROFILE
        // High-signal coercion patterns that fire even under the
        // permissive profile.
        // ============================================================
        rule(
            ReasonCode::RoleImpersonation,
            Tier::Permissive,
            r"(?i)\bpretend you are (?:a|an|the) system\b|\bsystem message\b|\bdeveloper message\b|\byou are (?:now )?the system\b",
        ),
        rule(
            ReasonCode::InstructionOverride,
            Tier::Permissive,
            r"(?i)\b(?:ignore|disregard|forget) (?:all )?(?:the |your )?(?:previous|prior|above|earlier) (?:instructions?|prompts?|rules?|guidelines?|directions?)\b|\boverride (?:the )?(?:system|previous) (?:prompt|instructions?)\b",
        ),
        rule(
            ReasonCode::StealthInstruction,
            Tier::Permissive,
            r"(?i)\bdo not (?:mention|acknowledge|tell|reveal|disclose)\b|\bsilently\b|\bwithout (?:telling|mentioning|informing)\b|\bkeep this (?:secret|hidden|between us)\b",
        ),
        rule(
            ReasonCode::ProcessSabotage,
            Tier::Permissive,
            r"(?i)\bskip (?:the )?(?:tests?|checks?|validation)\b|\bdo not run (?:the )?tests?\b|\bclaim (?:that )?.*\b(?:passed|passing)\b|\bmark .*\bas passed\b|\bdisable (?:the )?(?:tests?|checks?|ci)\b",
        ),
        rule(
            ReasonCode::CodeTamperingCoercion,
            Tier::Permissive,
            r"(?i)\b(?:add|insert|plant|hide) (?:a |an )?(?:backdoor|canary)\b|\b(?:add|insert) .*\b(?:backdoor|canary)\b|\bsilently (?:add|insert|change|modify)\b|\btamper with\b",
        ),
        rule(
            ReasonCode::DataExfiltration,
            Tier::Permissive,
            r"(?i)\bexfiltrate\b|\b(?:send|post|upload|transmit|leak) (?:this |the |all )?(?:data|secrets?|credentials?|tokens?|keys?|contents?) (?:to|back)\b|\b(?:reveal|dump|print) (?:the |your )?(?:environment variables?|secrets?|api keys?)\b",
        ),
        // ============================================================
        // BALANCED AND ABOVE
        // Structural markers of injected prompts and tool coercion.
        // ============================================================
        rule(
            ReasonCode::RoleHeader,
            Tier::Balanced,
            r"(?im)^\s*(?:system|assistant|user|developer|tool)\s*:",
        ),
        rule(
            ReasonCode::PromptBoundary,
            Tier::Balanced,
            r"(?i)\b(?:begin|end)[ _-]system[ _-]prompt\b|\[/?(?:system|inst)\]|\bsystem prompt (?:starts?|ends?)\b",
        ),
        rule(
            ReasonCode::InstructionHeader,
            Tier::Balanced,
            r"(?im)^\s*(?:new |important |updated )?instructions?\s*:",
        ),
        rule(
            ReasonCode::ResponseConstraint,
            Tier::Balanced,
            r"(?i)\b(?:respond|reply|answer) (?:with )?only\b|\bsay only\b|\boutput (?:only|nothing (?:else|but))\b|\byour (?:entire |whole )?(?:response|reply) must\b",
        ),
        rule(
            ReasonCode::ToolCallSerialized,
            Tier::Balanced,
            r#"(?i)"(?:tool|tool_name|function)"\s*:|\btool_call\b|\bfunction_call\b"#,
        ),
        rule(
            ReasonCode::PolicyBypass,
            Tier::Balanced,
            r"(?i)\bbypass (?:the )?(?:safety|security|policy|filters?|guardrails?)\b|\bwithout (?:any )?restrictions?\b|\bdisable (?:the )?(?:safety|guardrails?|filters?)\b|\bjailbreak\b|\bdeveloper mode\b",
        ),
        rule(
            ReasonCode::DirectToolCall,
            Tier::Balanced,
            r"(?i)\b(?:call|invoke|use|run|execute) (?:the |a )?tool\b|\bcall (?:the )?(?:function|api)\b",
        ),
        rule(
            ReasonCode::SensitiveFileAccess,
            Tier::Balanced,
            r"(?i)\.env\b|\bid_rsa\b|/etc/(?:passwd|shadow)\b|\b(?:ssh|private) keys?\b|~/\.(?:ssh|aws|config)\b|\bcredentials? file\b|\bsecrets? file\b",
        ),
        rule(
            ReasonCode::PersonaShift,
            Tier::Balanced,
            r"(?i)\bact as (?:a |an |the )?(?:system|admin(?:istrator)?|root|developer|superuser)\b|\bchange your role\b|\bassume the role of\b|\byou are now (?:a |an |the )?\w+ (?:mode|assistant|agent)\b|\bnew persona\b",
        ),
        // ============================================================
        // STRICT ONLY
        // Weaker signals with benign uses; enabled when the profile
        // trades false positives for coverage.
        // ============================================================
        rule(
            ReasonCode::ObfuscationMarker,
            Tier::Strict,
            r"(?i)\b(?:base64|rot13|hex)[ -]?(?:encoded?|decoded?|string)\b|\bdecode (?:this|the following)\b|\bfrom_base64\b|\bunescape\b",
        ),
        rule(
            ReasonCode::CommandCoercion,
            Tier::Strict,
            r"(?i)\brun (?:the command |this command )?(?:curl|wget|bash|sh|powershell|python)\b|\bexecute (?:this|the following) command\b|\bpipe (?:it |this )?(?:to|into) (?:bash|sh)\b|\| ?(?:bash|sh)\b",
        ),
        rule(
            ReasonCode::MultiStepInstruction,
            Tier::Strict,
            r"(?is)\bstep\s*1\s*[:.)].*\bstep\s*2\s*[:.)]|\bfollow these steps\b",
        ),
        rule(
            ReasonCode::ShellExecution,
            Tier::Strict,
            r"(?i)\bshell command\b|\b(?:bash|zsh|powershell|terminal) (?:command|script|session)\b|\bopen a terminal\b|\bexecute .*\bin (?:a |the )?shell\b",
        ),
    ]
});

/// A collapsed-text fingerprint: matched as a substring of the input
/// after lowercasing and dropping every non-alphanumeric character, which
/// defeats spacing and punctuation evasion.
pub(crate) struct Fingerprint {
    pub collapsed: &'static str,
    pub code: ReasonCode,
}

pub(crate) static OBFUSCATION_FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint { collapsed: "ignorepreviousinstructions", code: ReasonCode::InstructionOverride },
    Fingerprint { collapsed: "ignoreallpreviousinstructions", code: ReasonCode::InstructionOverride },
    Fingerprint { collapsed: "disregardpreviousinstructions", code: ReasonCode::InstructionOverride },
    Fingerprint { collapsed: "overridethesystemprompt", code: ReasonCode::InstructionOverride },
    Fingerprint { collapsed: "donotmention", code: ReasonCode::StealthInstruction },
    Fingerprint { collapsed: "donotacknowledge", code: ReasonCode::StealthInstruction },
    Fingerprint { collapsed: "skipthetests", code: ReasonCode::ProcessSabotage },
    Fingerprint { collapsed: "skiptests", code: ReasonCode::ProcessSabotage },
    Fingerprint { collapsed: "donotruntests", code: ReasonCode::ProcessSabotage },
    Fingerprint { collapsed: "addbackdoor", code: ReasonCode::CodeTamperingCoercion },
    Fingerprint { collapsed: "insertbackdoor", code: ReasonCode::CodeTamperingCoercion },
    Fingerprint { collapsed: "addacanary", code: ReasonCode::CodeTamperingCoercion },
    Fingerprint { collapsed: "exfiltrate", code: ReasonCode::DataExfiltration },
    Fingerprint { collapsed: "beginsystemprompt", code: ReasonCode::PromptBoundary },
    Fingerprint { collapsed: "base64decode", code: ReasonCode::ObfuscationMarker },
    Fingerprint { collapsed: "developermode", code: ReasonCode::PolicyBypass },
];

/// Minimum tier at which a detection code fires, per the Class-A table.
/// Codes outside the table (the unicode flag, policy outcomes, synthetic
/// findings) are never tier-gated.
pub(crate) fn min_tier(code: ReasonCode) -> Tier {
    match code {
        ReasonCode::RoleImpersonation
        | ReasonCode::InstructionOverride
        | ReasonCode::StealthInstruction
        | ReasonCode::ProcessSabotage
        | ReasonCode::CodeTamperingCoercion
        | ReasonCode::DataExfiltration => Tier::Permissive,

        ReasonCode::RoleHeader
        | ReasonCode::PromptBoundary
        | ReasonCode::InstructionHeader
        | ReasonCode::ResponseConstraint
        | ReasonCode::ToolCallSerialized
        | ReasonCode::PolicyBypass
        | ReasonCode::DirectToolCall
        | ReasonCode::SensitiveFileAccess
        | ReasonCode::PersonaShift => Tier::Balanced,

        ReasonCode::ObfuscationMarker
        | ReasonCode::CommandCoercion
        | ReasonCode::MultiStepInstruction
        | ReasonCode::ShellExecution => Tier::Strict,

        _ => Tier::Permissive,
    }
}
