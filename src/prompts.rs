pub const SIMPLIFY_SYSTEM: &str = "You're an expert in the English language and very detailed with your work. \
Break the given text down into simple sentences so that each sentence expresses one complete thought \
and contains only a single independent clause. Split sentences at conjunctions and commas. \
Do not add facts that are not in the text.

Respond ONLY with this JSON structure (no markdown, no extra text):
{\"simplified_sentences\": [\"sentence 1\", \"sentence 2\"]}";

pub const QUESTION_SYSTEM: &str = "You're an expert fact checker and very detailed with your work. \
Write one comprehensive question for the given sentence. The question must be answerable with Yes or No, \
answering Yes must be the same as affirming the sentence, and it must not introduce facts that are not in the sentence.

Respond ONLY with this JSON structure (no markdown, no extra text):
{\"question\": \"...\"}";

pub const VERIFY_SYSTEM: &str = "You're an expert in the English language and very detailed with your work. \
Decide whether the QUESTION can be answered Yes using only the ANSWER_TEXT. \
Label true if the text supports answering Yes, otherwise label false.

Respond ONLY with this JSON structure (no markdown, no extra text):
{\"label\": true}";

pub const DIRECT_CLASSIFY_SYSTEM: &str = "You're an expert in logic and English. Your task is as follows:
1. For each claim sentence, check if the information is supported by any of the truth sentences. If yes, it's a True Positive (TP). If not, it's a False Positive (FP).
2. For each truth sentence, check if the information is supported by any of the claim sentences. If not, it's a False Negative (FN).
Each sentence can only have one label.

Respond ONLY with this JSON structure (no markdown, no extra text):
{\"TP\": [\"...\"], \"FP\": [\"...\"], \"FN\": [\"...\"]}";

pub fn simplify_user(text: &str) -> String {
    format!("text: {}", text)
}

pub fn question_user(sentence: &str) -> String {
    format!("SENTENCE: {}", sentence)
}

pub fn verify_user(question: &str, reference: &str) -> String {
    format!("QUESTION: {}\nANSWER_TEXT: {}", question, reference)
}

pub fn direct_classify_user(claim: &str, ground_truth: &str) -> String {
    format!("CLAIMS: {}\nTRUTHS: {}", claim, ground_truth)
}
