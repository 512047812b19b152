//! The embedded rename table for the pattern catalog.
//!
//! Names move to the two-word convention; anchors are derived from the
//! names when the table is loaded.

use super::table::RecordKind::{self, Antipattern, Pattern};

pub(crate) const BUILTIN_RECORDS: &[(&str, &str, RecordKind)] = &[
    // Foundation
    ("AI Readiness Assessment", "Readiness Assessment", Pattern),
    ("Rules as Code", "Codified Rules", Pattern),
    ("AI Security Sandbox", "Security Sandbox", Pattern),
    ("AI Developer Lifecycle", "Developer Lifecycle", Pattern),
    ("AI Tool Integration", "Tool Integration", Pattern),
    ("AI Issue Generation", "Issue Generation", Pattern),
    // Development
    ("Specification Driven Development", "Spec-Driven Development", Pattern),
    ("AI Plan-First Development", "Planned Implementation", Pattern),
    ("Progressive AI Enhancement", "Progressive Enhancement", Pattern),
    ("AI Choice Generation", "Choice Generation", Pattern),
    ("Atomic Task Decomposition", "Atomic Decomposition", Pattern),
    ("Parallelized AI Coding Agents", "Parallel Agents", Pattern),
    ("AI Context Persistence", "Context Persistence", Pattern),
    ("Constraint-Based AI Development", "Constrained Generation", Pattern),
    ("Observable AI Development", "Observable Development", Pattern),
    ("AI-Driven Refactoring", "Guided Refactoring", Pattern),
    ("AI-Driven Architecture Design", "Guided Architecture", Pattern),
    ("AI-Driven Traceability", "Automated Traceability", Pattern),
    // Operations
    ("Policy-as-Code Generation", "Policy Generation", Pattern),
    ("Security Scanning Orchestration", "Security Orchestration", Pattern),
    ("Performance Baseline Management", "Baseline Management", Pattern),
    // Experimental
    ("Human-AI Handoff Protocol", "Handoff Protocols", Pattern),
    ("Comprehensive AI Testing Strategy", "Test Orchestration", Pattern),
    ("AI Workflow Orchestration", "Workflow Orchestration", Pattern),
    ("AI Review Automation", "Review Automation", Pattern),
    ("Technical Debt Forecasting", "Debt Forecasting", Pattern),
    ("AI-Guided Blue-Green Deployment", "Guided Deployment", Pattern),
    ("Drift Detection & Remediation", "Drift Remediation", Pattern),
    ("Release Note Synthesis", "Release Synthesis", Pattern),
    ("Incident Response Automation", "Incident Automation", Pattern),
    ("Test Suite Health Management", "Suite Health", Pattern),
    ("Dependency Upgrade Advisor", "Upgrade Advisor", Pattern),
    ("On-Call Handoff Automation", "Handoff Automation", Pattern),
    ("Chaos Engineering Scenarios", "Chaos Engineering", Pattern),
    ("ChatOps Security Integration", "ChatOps Security", Pattern),
    ("Compliance Evidence Automation", "Evidence Automation", Pattern),
    ("Context Window Optimization", "Context Optimization", Pattern),
    ("Visual Context Scaffolding", "Visual Scaffolding", Pattern),
    ("AI Event Automation", "Event Automation", Pattern),
    ("Custom AI Commands", "Custom Commands", Pattern),
    // Antipatterns
    ("Blind AI Trust", "Blind Trust", Antipattern),
    ("Unrestricted AI Access", "Unrestricted Access", Antipattern),
    ("Monolithic AI Prompts", "Monolithic Prompts", Antipattern),
    ("Over-Engineered AI Rules", "Over-Specified Rules", Antipattern),
    ("Contextless AI Sessions", "Contextless Sessions", Antipattern),
];

pub(crate) const BUILTIN_DIRECTORIES: &[(&str, &str)] = &[
    ("examples/rules-as-code", "examples/codified-rules"),
    ("examples/ai-security-sandbox", "examples/security-sandbox"),
    ("examples/ai-tool-integration", "examples/tool-integration"),
    ("examples/ai-issue-generation", "examples/issue-generation"),
    (
        "examples/specification-driven-development",
        "examples/spec-driven-development",
    ),
    ("examples/atomic-task-decomposition", "examples/atomic-decomposition"),
    ("examples/observable-ai-development", "examples/observable-development"),
    ("examples/ai-driven-refactoring", "examples/guided-refactoring"),
    ("examples/ai-driven-traceability", "examples/automated-traceability"),
    (
        "experiments/examples/human-ai-handoff",
        "experiments/examples/handoff-protocols",
    ),
];
