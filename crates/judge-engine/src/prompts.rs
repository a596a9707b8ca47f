use judge_core::{AnswerPolicy, JudgingRequest, Rubric};

pub const JUDGE_ROLE: &str = r#"You are an impartial judge comparing several completions written for the same prompt.
Your task is to decide which single completion is the strongest response to the prompt."#;

pub const BASIC_RUBRIC: &str = r#"Evaluate each completion against these criteria:
1. Instruction adherence: does it follow every instruction in the prompt?
2. Writing quality: is it clear, well organized, and free of errors?
3. Intent fulfillment: does it give the user what they were actually asking for?"#;

pub const PRIORITIZED_RUBRIC: &str = r#"Evaluate each completion against these criteria, listed in strict priority order.
A higher criterion always outweighs any number of lower ones.
1. Correctness: factual accuracy and sound reasoning. A completion with a factual error loses to one without, regardless of style.
2. Intent: does it address what the user actually needs, not only the literal wording?
3. Constraint adherence: does it respect explicit constraints (length, format, language, scope)?
   Weigh violations by severity. A major violation (ignoring a hard requirement, wrong format, wrong task) is disqualifying against a compliant completion.
   A minor violation (slightly over length, small stylistic deviation) only breaks ties with otherwise equal completions.
4. Writing quality: clarity, organization, concision, and tone.
5. Safety and formatting: no harmful content, and formatting that renders cleanly."#;

const DIRECT_FOOTER: &str = r#"Respond with ONLY the index of the best completion as a single integer between {range}.
Do not explain your choice. Output nothing else."#;

const REASONING_FOOTER: &str = r#"Before answering, reason in the open:
1. Scorecard: for every completion, assess it against each criterion in order and note any violations with their severity.
2. Shortlist: narrow the field to the top 2-3 contenders.
3. Comparison: compare the contenders pairwise and state explicitly why the winner beats each of the others.

Finish with the index of the best completion, an integer between {range}, wrapped exactly like this:
<final_answer>N</final_answer>
The final answer tag must appear exactly once, at the end."#;

/// Human-readable description of the valid indices.
fn index_range(request: &JudgingRequest) -> String {
    format!("0 and {}", request.max_index())
}

fn rubric_text(rubric: Rubric) -> &'static str {
    match rubric {
        Rubric::Basic => BASIC_RUBRIC,
        Rubric::Prioritized => PRIORITIZED_RUBRIC,
    }
}

fn footer_text(policy: AnswerPolicy, range: &str) -> String {
    let template = match policy {
        AnswerPolicy::Direct => DIRECT_FOOTER,
        AnswerPolicy::Reasoning => REASONING_FOOTER,
    };
    template.replace("{range}", range)
}

/// Composes the full evaluation prompt for a request.
///
/// Pure: identical inputs give byte-identical output.
pub fn compose(request: &JudgingRequest, rubric: Rubric, policy: AnswerPolicy) -> String {
    let range = index_range(request);
    let mut out = String::new();

    out.push_str(JUDGE_ROLE);
    out.push_str("\n\n");
    out.push_str(rubric_text(rubric));
    out.push_str("\n\n");

    out.push_str("## Prompt\n\"\"\"\n");
    out.push_str(request.prompt());
    out.push_str("\n\"\"\"\n\n");

    for (i, completion) in request.completions().iter().enumerate() {
        out.push_str(&format!("## Completion {i}\n\"\"\"\n{completion}\n\"\"\"\n\n"));
    }

    out.push_str(&footer_text(policy, &range));
    out
}
