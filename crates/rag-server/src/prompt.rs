//! Prompt templates.
//!
//! The MCQ and essay templates ask the model to write in the `Soal` / `Jawaban` /
//! `Penjelasan` layout that `question_parser` understands. The JSON template asks for a
//! bare JSON object.

/// Substrings (matched case-insensitively) that mark a request as a multiple-choice
/// request.
const MCQ_KEYWORDS: [&str; 4] = ["soal", "pilihan ganda", "mcq", "multiple choice"];

pub fn is_mcq_request(query: &str) -> bool {
    let lowered = query.to_lowercase();
    MCQ_KEYWORDS.iter().any(|k| lowered.contains(k))
}

pub fn mcq_prompt(question: &str, context: &str) -> String {
    format!(
        r#"Berdasarkan konteks berikut, buatkan soal pilihan ganda sesuai permintaan.
Setiap soal HARUS memiliki pertanyaan yang lengkap (bukan hanya nomor).

Format yang WAJIB diikuti untuk setiap soal:

Soal [nomor]:
[Tulis pertanyaan lengkap di sini (WAJIB)]
A) [pilihan A]
B) [pilihan B]
C) [pilihan C]
D) [pilihan D]
Jawaban: [A/B/C/D] (Jawaban benar harus tersebar secara acak, tidak boleh hanya di A atau B)

Contoh format yang benar:
Soal 1:
Apakah fungsi utama dari katup bahan bakar pada sistem MPK?
A) Mengatur aliran
B) Menyaring kotoran
C) Mengukur tekanan
D) Menghentikan aliran
Jawaban: A

Soal 2:
Apa yang dimaksud dengan titik didih dalam ilmu fisika?
A) Titik di mana cairan membeku
B) Titik di mana cairan menguap menjadi gas
C) Titik di mana zat padat mencair
D) Titik di mana gas berubah menjadi cair
Jawaban: B

Perhatikan bahwa setiap soal HARUS memiliki:
1. Pertanyaan lengkap (bukan hanya nomor).
2. Empat pilihan jawaban (A, B, C, D).
3. **Jawaban benar harus tersebar di antara A, B, C, dan D, bukan hanya di A atau B.**
4. Pastikan tidak ada soal yang terduplikasi.
5. Pastikan total soal yang dibuat sesuai dengan soal yang saya minta di prompt saya.

Konteks: {context}

Permintaan: {question}"#
    )
}

pub fn essay_prompt(question: &str, context: &str) -> String {
    format!(
        r#"Berdasarkan konteks berikut, buatkan soal essay sesuai permintaan.
Format setiap soal dengan struktur yang konsisten seperti berikut:

Soal [nomor]:
[pertanyaan lengkap]

Jawaban:
[jawaban lengkap]

Penjelasan:
[penjelasan detail tentang jawaban]

Pastikan setiap soal memiliki:
1. Pertanyaan yang jelas dan mendetail
2. Jawaban yang komprehensif
3. Penjelasan tambahan yang membantu pemahaman

Konteks: {context}

Permintaan: {question}"#
    )
}

pub fn json_prompt(question: &str, context: &str) -> String {
    format!(
        r#"Based on the following context, answer the question and format your response as valid JSON.
The JSON should include 'answer' and 'confidence' fields.

Context: {context}

Question: {question}

Respond with valid JSON only, following this structure:
{{
    "answer": "your detailed answer here",
    "confidence": 0.95,
    "references": ["relevant reference 1", "relevant reference 2"],
    "tags": ["relevant_tag1", "relevant_tag2"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mcq_keywords_case_insensitively() {
        assert!(is_mcq_request("Buatkan 5 SOAL tentang fotosintesis"));
        assert!(is_mcq_request("berikan pilihan ganda"));
        assert!(is_mcq_request("Generate 3 Multiple Choice questions"));
        assert!(is_mcq_request("mcq on cells"));
        assert!(!is_mcq_request("Apa itu fotosintesis?"));
        assert!(!is_mcq_request("Jelaskan pilihan jawaban"));
    }

    #[test]
    fn templates_embed_context_and_request() {
        let prompt = mcq_prompt("buatkan 2 soal", "Klorofil menyerap cahaya.");
        assert!(prompt.contains("Konteks: Klorofil menyerap cahaya."));
        assert!(prompt.ends_with("Permintaan: buatkan 2 soal"));
        assert!(prompt.contains("Jawaban: [A/B/C/D]"));

        let prompt = essay_prompt("buatkan essay", "ctx");
        assert!(prompt.contains("Penjelasan:\n[penjelasan detail tentang jawaban]"));
        assert!(prompt.ends_with("Permintaan: buatkan essay"));
    }

    #[test]
    fn json_template_keeps_literal_braces() {
        let prompt = json_prompt("what?", "ctx");
        assert!(prompt.contains("Question: what?"));
        assert!(prompt.contains("{\n    \"answer\""));
        assert!(prompt.ends_with('}'));
    }
}
