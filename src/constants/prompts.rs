pub const GRADING_SYSTEM_PROMPT: &str = "You grade short free-text answers to course quiz questions. \
Reply with exactly one word: true if the answer is correct, maybe if it is partially correct \
or too vague to judge, false if it is wrong or unrelated.";

pub fn grading_user_prompt(question: &str, answer: &str) -> String {
    format!(
        "Grade the following answer with 3 options (true, false, maybe) based on its correctness.\n\nQuestion: {}\nAnswer: {}",
        question, answer
    )
}
