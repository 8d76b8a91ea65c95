use crate::tools::Toolset;

/// Zero-shot ReAct prompt: tools, prior turns, the question and the running scratchpad.
pub fn build_react_prompt(tools: &Toolset, history: &str, question: &str, scratchpad: &str) -> String {
    let history = if history.trim().is_empty() {
        String::new()
    } else {
        format!("Previous conversation:\n{}\n\n", history.trim_end())
    };

    format!(
        "You are a research assistant. Answer the following questions as best you can. \
You have access to the following tools:\n\
\n\
{descriptions}\n\
\n\
Use the following format:\n\
\n\
Question: the input question you must answer\n\
Thought: you should always think about what to do\n\
Action: the action to take, should be one of [{names}]\n\
Action Input: the input to the action\n\
Observation: the result of the action\n\
... (this Thought/Action/Action Input/Observation can repeat N times)\n\
Thought: I now know the final answer\n\
Final Answer: the final answer to the original input question\n\
\n\
{history}Begin!\n\
\n\
Question: {question}\n\
Thought:{scratchpad}",
        descriptions = tools.describe(),
        names = tools.names().join(", "),
    )
}
