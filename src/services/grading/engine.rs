//! Scoring over loaded exam rows. Nothing here touches storage.

use std::collections::{BTreeMap, HashMap, HashSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::db::models::{QuestionChoice, SectionQuestion, Student, StudentAnswer};
use crate::db::types::{DifficultyLevel, StudentStatus};

type QuestionKey = (i32, i32);

/// Weights and correct choices of one exam.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnswerKey {
    weights: HashMap<QuestionKey, f64>,
    correct: HashSet<(i32, i32, i32)>,
}

impl AnswerKey {
    pub(crate) fn new(questions: &[SectionQuestion], choices: &[QuestionChoice]) -> Self {
        let weights = questions
            .iter()
            .map(|question| ((question.section_id, question.question_id), question.weight))
            .collect();
        let correct = choices
            .iter()
            .filter(|choice| choice.is_correct)
            .map(|choice| (choice.section_id, choice.question_id, choice.choice_id))
            .collect();

        Self { weights, correct }
    }

    pub(crate) fn total_questions(&self) -> usize {
        self.weights.len()
    }

    /// Highest achievable score, independent of who took part.
    pub(crate) fn total_exam_score(&self) -> f64 {
        self.weights.values().sum()
    }

    fn knows(&self, answer: &StudentAnswer) -> bool {
        self.weights.contains_key(&(answer.section_id, answer.question_id))
    }

    /// Weight earned by one answer. A choice outside the answered
    /// question's own scope never matches a correct choice and earns zero.
    fn earned(&self, answer: &StudentAnswer) -> f64 {
        let key = (answer.section_id, answer.question_id, answer.student_choice);
        if self.correct.contains(&key) {
            self.weights.get(&(answer.section_id, answer.question_id)).copied().unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StudentGrade {
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) exam_id: String,
    pub(crate) total_questions: usize,
    pub(crate) number_of_solved_questions: usize,
    pub(crate) score: f64,
    pub(crate) total_exam_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RecordedAnswer {
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    pub(crate) student_choice: i32,
    pub(crate) question_order: i32,
    pub(crate) section_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GradeWithAnswers {
    #[serde(flatten)]
    pub(crate) grade: StudentGrade,
    pub(crate) student_answers: Vec<RecordedAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ExamStats {
    pub(crate) number_of_students: usize,
    pub(crate) number_of_submitted_students: usize,
    pub(crate) number_of_absent_students: usize,
    pub(crate) avg_score: f64,
    pub(crate) min_score: f64,
    pub(crate) max_score: f64,
    pub(crate) total_exam_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChoiceDetail {
    pub(crate) choice_id: i32,
    pub(crate) choice_text: String,
    pub(crate) is_correct: bool,
    pub(crate) is_student_choice: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionDetail {
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    pub(crate) question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) diagram: Option<String>,
    pub(crate) weight: f64,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) student_choice: Option<i32>,
    pub(crate) choices: Vec<ChoiceDetail>,
}

/// One student's grade plus every question of the exam with their selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StudentDetail {
    #[serde(flatten)]
    pub(crate) grade: StudentGrade,
    pub(crate) questions: Vec<QuestionDetail>,
}

fn answers_by_student(answers: &[StudentAnswer]) -> HashMap<&str, Vec<&StudentAnswer>> {
    let mut grouped: HashMap<&str, Vec<&StudentAnswer>> = HashMap::new();
    for answer in answers {
        grouped.entry(answer.student_id.as_str()).or_default().push(answer);
    }
    grouped
}

fn grade(key: &AnswerKey, student: &Student, answers: &[&StudentAnswer]) -> StudentGrade {
    let counted: Vec<_> = answers.iter().filter(|answer| key.knows(answer)).collect();

    StudentGrade {
        student_id: student.id.clone(),
        name: student.name.clone(),
        exam_id: student.exam_id.clone(),
        total_questions: key.total_questions(),
        number_of_solved_questions: counted.len(),
        score: counted.iter().map(|answer| key.earned(answer)).sum(),
        total_exam_score: key.total_exam_score(),
    }
}

/// Grades of every enrolled student, ordered by student id.
pub(crate) fn grades(
    key: &AnswerKey,
    students: &[Student],
    answers: &[StudentAnswer],
) -> Vec<StudentGrade> {
    let grouped = answers_by_student(answers);
    let mut grades: Vec<_> = students
        .iter()
        .map(|student| {
            let own = grouped.get(student.id.as_str()).map(Vec::as_slice).unwrap_or_default();
            grade(key, student, own)
        })
        .collect();
    grades.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    grades
}

pub(crate) fn grades_with_answers(
    key: &AnswerKey,
    students: &[Student],
    answers: &[StudentAnswer],
) -> Vec<GradeWithAnswers> {
    let grouped = answers_by_student(answers);

    grades(key, students, answers)
        .into_iter()
        .map(|grade| {
            let mut student_answers: Vec<_> = grouped
                .get(grade.student_id.as_str())
                .into_iter()
                .flatten()
                .map(|answer| RecordedAnswer {
                    section_id: answer.section_id,
                    question_id: answer.question_id,
                    student_choice: answer.student_choice,
                    question_order: answer.question_order,
                    section_order: answer.section_order,
                })
                .collect();
            student_answers.sort_by_key(|answer| (answer.section_id, answer.question_id));
            GradeWithAnswers { grade, student_answers }
        })
        .collect()
}

/// Score extremes and the average are taken over students with at least one
/// answer; students who answered nothing are left out rather than counted as zero.
pub(crate) fn exam_stats(
    key: &AnswerKey,
    students: &[Student],
    answers: &[StudentAnswer],
) -> ExamStats {
    let grouped = answers_by_student(answers);

    let scores: Vec<f64> = students
        .iter()
        .filter_map(|student| grouped.get(student.id.as_str()))
        .filter(|own| !own.is_empty())
        .map(|own| own.iter().map(|answer| key.earned(answer)).sum::<f64>())
        .collect();

    let (avg_score, min_score, max_score) = if scores.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = scores.iter().sum();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (sum / scores.len() as f64, min, max)
    };

    ExamStats {
        number_of_students: students.len(),
        number_of_submitted_students: students
            .iter()
            .filter(|student| student.status.is_submitted())
            .count(),
        number_of_absent_students: students
            .iter()
            .filter(|student| student.status == StudentStatus::NotStarted)
            .count(),
        avg_score,
        min_score,
        max_score,
        total_exam_score: key.total_exam_score(),
    }
}

pub(crate) fn student_detail(
    key: &AnswerKey,
    questions: &[SectionQuestion],
    choices: &[QuestionChoice],
    student: &Student,
    answers: &[StudentAnswer],
) -> StudentDetail {
    let own: Vec<&StudentAnswer> =
        answers.iter().filter(|answer| answer.student_id == student.id).collect();
    let selected: HashMap<QuestionKey, i32> = own
        .iter()
        .map(|answer| ((answer.section_id, answer.question_id), answer.student_choice))
        .collect();

    let mut choices_by_question: BTreeMap<QuestionKey, Vec<&QuestionChoice>> = BTreeMap::new();
    for choice in choices {
        choices_by_question.entry((choice.section_id, choice.question_id)).or_default().push(choice);
    }

    let mut ordered: Vec<&SectionQuestion> = questions.iter().collect();
    ordered.sort_by_key(|question| (question.section_id, question.question_id));

    let questions = ordered
        .into_iter()
        .map(|question| {
            let question_key = (question.section_id, question.question_id);
            let student_choice = selected.get(&question_key).copied();
            let mut own_choices =
                choices_by_question.remove(&question_key).unwrap_or_default();
            own_choices.sort_by_key(|choice| choice.choice_id);

            QuestionDetail {
                section_id: question.section_id,
                question_id: question.question_id,
                question_text: question.question_text.clone(),
                diagram: question.diagram.as_ref().map(|bytes| STANDARD.encode(bytes)),
                weight: question.weight,
                difficulty: question.difficulty,
                student_choice,
                choices: own_choices
                    .into_iter()
                    .map(|choice| ChoiceDetail {
                        choice_id: choice.choice_id,
                        choice_text: choice.choice_text.clone(),
                        is_correct: choice.is_correct,
                        is_student_choice: student_choice == Some(choice.choice_id),
                    })
                    .collect(),
            }
        })
        .collect();

    StudentDetail { grade: grade(key, student, &own), questions }
}
