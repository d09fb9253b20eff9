// src/agent/prompts.rs — Prompt builders for the LLM-backed research capabilities

use super::parser::DIMENSIONS;

/// System prompt shared by every capability call.
pub const SYSTEM_PROMPT: &str = "You are a careful business analyst investigating a question \
     against a tabular dataset. Ground every claim in the data you are given, say when the \
     data cannot support a claim, and prefer concrete numbers over generalities.";

pub fn plan_prompt(query: &str) -> String {
    format!(
        "Given this business question: {query}\n\n\
         Decompose it into key analytical components:\n\
         1. What data sources are needed?\n\
         2. What patterns should be examined?\n\
         3. What metrics should be calculated?\n\
         4. What causal relationships might exist?\n\n\
         Provide a structured plan."
    )
}

pub fn execute_prompt(plan: &str, dataset_profile: &str) -> String {
    format!(
        "## Plan\n{plan}\n\n\
         ## Dataset\n{dataset_profile}\n\
         Carry out as much of the plan as this dataset allows. For each step, report the \
         observation, the columns and figures it rests on, and any step the data cannot \
         answer. Report findings only; do not write the final answer yet."
    )
}

pub fn reflect_prompt(query: &str, findings: &str) -> String {
    let score_lines: String = DIMENSIONS.iter().map(|d| format!("{d}: <0.0-1.0>\n")).collect();
    format!(
        "Query: {query}\n\n\
         Current findings: {findings}\n\n\
         Evaluate completeness on 0-1 scale across these dimensions:\n\
         1. Descriptive: Are observed patterns fully documented?\n\
         2. Explanatory: Are causal mechanisms identified?\n\
         3. Evidential: Do we have supporting data for all claims?\n\
         4. Actionability: Can we make concrete recommendations?\n\n\
         Respond in exactly this format:\n\
         SCORES:\n\
         {score_lines}\
         ANALYSIS:\n\
         <what is established and what is still missing>"
    )
}

pub fn gaps_prompt(query: &str) -> String {
    format!(
        "Given this query: {query}\n\n\
         And the investigation so far, what information gaps remain?\n\
         What alternative hypotheses haven't been ruled out?\n\
         What causal mechanisms need further investigation?"
    )
}

pub fn revise_prompt(plan: &str, gaps: &str) -> String {
    format!(
        "Current plan: {plan}\n\n\
         Identified gaps: {gaps}\n\n\
         Update the analytical plan to address these gaps."
    )
}

pub fn synthesize_prompt(query: &str) -> String {
    format!(
        "Query: {query}\n\n\
         Based on this complete investigation, provide:\n\
         1. Root cause analysis\n\
         2. Supporting evidence\n\
         3. Causal mechanisms\n\
         4. Actionable recommendations\n\n\
         Synthesize into coherent narrative."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_prompt_contains_query() {
        let p = plan_prompt("Why did profit decline?");
        assert!(p.contains("Why did profit decline?"));
        assert!(p.contains("causal relationships"));
    }

    #[test]
    fn test_reflect_prompt_lists_every_dimension() {
        let p = reflect_prompt("q", "f");
        for d in DIMENSIONS {
            assert!(p.contains(&format!("{d}: <0.0-1.0>")), "missing {d}");
        }
        assert!(p.contains("SCORES:\n"));
        assert!(p.contains("ANALYSIS:\n"));
    }

    #[test]
    fn test_execute_prompt_embeds_plan_and_profile() {
        let p = execute_prompt("1. check margins", "Dataset: x.csv (1 rows x 1 columns)");
        assert!(p.contains("## Plan\n1. check margins"));
        assert!(p.contains("Dataset: x.csv"));
    }

    #[test]
    fn test_revise_prompt() {
        let p = revise_prompt("old plan", "shipping costs");
        assert!(p.starts_with("Current plan: old plan"));
        assert!(p.contains("Identified gaps: shipping costs"));
    }
}
