//! The admit card record and its closed option sets.

use crate::assets;
use crate::error::RecordError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Option Sets
// ============================================================================

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RecordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == trimmed)
                    .ok_or_else(|| RecordError::InvalidOption {
                        field: $field,
                        value: s.to_string(),
                        allowed: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

choice_enum!(
    /// Exam category
    ExamCategory, "examCategory" {
        Regular => "Regular",
        Private => "Private",
        ExStudent => "Ex-Student",
    }
);

choice_enum!(
    /// Exam type
    ExamType, "examType" {
        Main => "Main",
        Reappear => "Reappear",
        Improvement => "Improvement",
    }
);

choice_enum!(
    /// Reservation category
    ReservationCategory, "category" {
        Unreserved => "UNRESERVED",
        Sc => "SC",
        St => "ST",
        Obc => "OBC",
    }
);

choice_enum!(
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
);

// ============================================================================
// Field Names
// ============================================================================

/// Free-text fields of the record, named as in the JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    SchoolName,
    SessionYears,
    ExamCenterName,
    CollegeName,
    ProgramName,
    SemesterYear,
    CandidateName,
    FatherName,
    MotherName,
    EnrollmentNumber,
    RollNumber,
    ExamFormNumber,
    PrintDateTime,
}

impl TextField {
    pub const ALL: &'static [TextField] = &[
        TextField::SchoolName,
        TextField::SessionYears,
        TextField::ExamCenterName,
        TextField::CollegeName,
        TextField::ProgramName,
        TextField::SemesterYear,
        TextField::CandidateName,
        TextField::FatherName,
        TextField::MotherName,
        TextField::EnrollmentNumber,
        TextField::RollNumber,
        TextField::ExamFormNumber,
        TextField::PrintDateTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextField::SchoolName => "schoolName",
            TextField::SessionYears => "sessionYears",
            TextField::ExamCenterName => "examCenterName",
            TextField::CollegeName => "collegeName",
            TextField::ProgramName => "programName",
            TextField::SemesterYear => "semesterYear",
            TextField::CandidateName => "candidateName",
            TextField::FatherName => "fatherName",
            TextField::MotherName => "motherName",
            TextField::EnrollmentNumber => "enrollmentNumber",
            TextField::RollNumber => "rollNumber",
            TextField::ExamFormNumber => "examFormNumber",
            TextField::PrintDateTime => "printDateTime",
        }
    }
}

/// Fields restricted to a fixed option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceField {
    ExamCategory,
    ExamType,
    Category,
    Gender,
}

impl ChoiceField {
    pub fn name(&self) -> &'static str {
        match self {
            ChoiceField::ExamCategory => "examCategory",
            ChoiceField::ExamType => "examType",
            ChoiceField::Category => "category",
            ChoiceField::Gender => "gender",
        }
    }
}

/// A typed value for one of the [`ChoiceField`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    ExamCategory(ExamCategory),
    ExamType(ExamType),
    Category(ReservationCategory),
    Gender(Gender),
}

impl Choice {
    pub fn parse(field: ChoiceField, value: &str) -> Result<Choice, RecordError> {
        Ok(match field {
            ChoiceField::ExamCategory => Choice::ExamCategory(value.parse()?),
            ChoiceField::ExamType => Choice::ExamType(value.parse()?),
            ChoiceField::Category => Choice::Category(value.parse()?),
            ChoiceField::Gender => Choice::Gender(value.parse()?),
        })
    }
}

/// Image slots that accept uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    SchoolLogo,
    StudentPhoto,
    StudentSignature,
}

impl ImageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            ImageSlot::SchoolLogo => "schoolLogo",
            ImageSlot::StudentPhoto => "studentPhoto",
            ImageSlot::StudentSignature => "studentSignature",
        }
    }
}

/// Any addressable field of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Text(TextField),
    Choice(ChoiceField),
    Image(ImageSlot),
}

impl FromStr for FieldName {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(field) = TextField::ALL.iter().find(|f| f.name() == name) {
            return Ok(FieldName::Text(*field));
        }
        let choice = [
            ChoiceField::ExamCategory,
            ChoiceField::ExamType,
            ChoiceField::Category,
            ChoiceField::Gender,
        ]
        .into_iter()
        .find(|f| f.name() == name);
        if let Some(field) = choice {
            return Ok(FieldName::Choice(field));
        }
        [
            ImageSlot::SchoolLogo,
            ImageSlot::StudentPhoto,
            ImageSlot::StudentSignature,
        ]
        .into_iter()
        .find(|f| f.name() == name)
        .map(FieldName::Image)
        .ok_or_else(|| RecordError::UnknownField(s.to_string()))
    }
}

// ============================================================================
// Subjects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        SubjectId(id.into())
    }

    /// Generate a time-ordered id that is not already taken in `existing`.
    pub fn generate(existing: &[SubjectRow]) -> Self {
        loop {
            let candidate = SubjectId(format!("subject-{}", Uuid::now_v7().simple()));
            if existing.iter().all(|row| row.id != candidate) {
                return candidate;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectColumn {
    PaperNo,
    Subject,
    SubjectName,
}

impl FromStr for SubjectColumn {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "paperNo" => Ok(SubjectColumn::PaperNo),
            "subject" => Ok(SubjectColumn::Subject),
            "subjectName" => Ok(SubjectColumn::SubjectName),
            other => Err(RecordError::UnknownColumn(other.to_string())),
        }
    }
}

/// One row of the subject table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub id: SubjectId,
    pub paper_no: String,
    pub subject: String,
    pub subject_name: String,
}

impl SubjectRow {
    fn sample(n: usize, subject: &str, subject_name: &str) -> Self {
        SubjectRow {
            id: SubjectId::new(format!("subject-{}", n)),
            paper_no: format!("Paper - {}", n),
            subject: subject.to_string(),
            subject_name: subject_name.to_string(),
        }
    }

    pub fn cell_mut(&mut self, column: SubjectColumn) -> &mut String {
        match column {
            SubjectColumn::PaperNo => &mut self.paper_no,
            SubjectColumn::Subject => &mut self.subject,
            SubjectColumn::SubjectName => &mut self.subject_name,
        }
    }
}

// ============================================================================
// Document Record
// ============================================================================

/// Everything printed on one admit card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub school_name: String,
    pub school_logo: String,
    pub session_years: String,

    pub exam_center_name: String,
    pub college_name: String,
    pub program_name: String,
    pub semester_year: String,

    pub candidate_name: String,
    pub father_name: String,
    pub mother_name: String,
    pub enrollment_number: String,
    pub roll_number: String,

    pub exam_form_number: String,
    pub exam_category: ExamCategory,
    pub exam_type: ExamType,
    pub category: ReservationCategory,
    pub gender: Gender,

    pub student_photo: String,
    pub student_signature: String,

    pub subjects: Vec<SubjectRow>,

    #[serde(default)]
    pub print_date_time: String,
}

impl DocumentRecord {
    /// The demo card the form opens with.
    pub fn sample() -> Self {
        DocumentRecord {
            school_name: "Chaudhary Charan Singh University, Meerut".to_string(),
            school_logo: assets::UNIVERSITY_LOGO.to_string(),
            session_years: "2023-2024".to_string(),
            exam_center_name: "[108] - SWAMI KALYAN DEV COLLEGE HASTINAPUR".to_string(),
            college_name: "[0108] - SWAMI KALYAN DEV COLLEGE HASTINAPUR".to_string(),
            program_name: "B.A. - NEP".to_string(),
            semester_year: "Semester 6".to_string(),
            candidate_name: "VANDANA MANDAL".to_string(),
            father_name: "VIBHUTI MANDAL".to_string(),
            mother_name: "SARASWATI MANDAL".to_string(),
            enrollment_number: "21126975".to_string(),
            roll_number: "210108301168".to_string(),
            exam_form_number: "260074238".to_string(),
            exam_category: ExamCategory::Regular,
            exam_type: ExamType::Main,
            category: ReservationCategory::Unreserved,
            gender: Gender::Female,
            student_photo: assets::PHOTO_PLACEHOLDER.to_string(),
            student_signature: assets::STUDENT_SIGNATURE.to_string(),
            subjects: vec![
                SubjectRow::sample(1, "ENGLISH", "A040601T-INDIAN & NEW LITERATURES IN ENGLISH"),
                SubjectRow::sample(2, "ENGLISH", "AD40602T-LITERATURE IN FILMS & MEDIA STUDIES"),
                SubjectRow::sample(3, "SOCIOLOGY", "A070601T-PIONEERS OF INDIAN SOCIOLOGY"),
                SubjectRow::sample(4, "SOCIOLOGY", "A070602T GENDER AND SOCIETY"),
                SubjectRow::sample(5, "SOCIOLOGY", "A070603R-MINOR RESEARCH PROJECT SOCIOLOGY"),
                SubjectRow::sample(
                    6,
                    "CO-CURRICULAR",
                    "208060T-COMMUNICATION SKILLS AND PERSONALITY DEVELOPMENT",
                ),
            ],
            print_date_time: "5/13/24    6:03 PM".to_string(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: DocumentRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Check the subject list invariants: non-empty, unique ids.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.subjects.is_empty() {
            return Err(RecordError::NoSubjects);
        }
        let mut seen = HashSet::new();
        for row in &self.subjects {
            if !seen.insert(&row.id) {
                return Err(RecordError::DuplicateSubjectId(row.id.to_string()));
            }
        }
        Ok(())
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::SchoolName => &self.school_name,
            TextField::SessionYears => &self.session_years,
            TextField::ExamCenterName => &self.exam_center_name,
            TextField::CollegeName => &self.college_name,
            TextField::ProgramName => &self.program_name,
            TextField::SemesterYear => &self.semester_year,
            TextField::CandidateName => &self.candidate_name,
            TextField::FatherName => &self.father_name,
            TextField::MotherName => &self.mother_name,
            TextField::EnrollmentNumber => &self.enrollment_number,
            TextField::RollNumber => &self.roll_number,
            TextField::ExamFormNumber => &self.exam_form_number,
            TextField::PrintDateTime => &self.print_date_time,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::SchoolName => &mut self.school_name,
            TextField::SessionYears => &mut self.session_years,
            TextField::ExamCenterName => &mut self.exam_center_name,
            TextField::CollegeName => &mut self.college_name,
            TextField::ProgramName => &mut self.program_name,
            TextField::SemesterYear => &mut self.semester_year,
            TextField::CandidateName => &mut self.candidate_name,
            TextField::FatherName => &mut self.father_name,
            TextField::MotherName => &mut self.mother_name,
            TextField::EnrollmentNumber => &mut self.enrollment_number,
            TextField::RollNumber => &mut self.roll_number,
            TextField::ExamFormNumber => &mut self.exam_form_number,
            TextField::PrintDateTime => &mut self.print_date_time,
        }
    }

    pub fn image(&self, slot: ImageSlot) -> &str {
        match slot {
            ImageSlot::SchoolLogo => &self.school_logo,
            ImageSlot::StudentPhoto => &self.student_photo,
            ImageSlot::StudentSignature => &self.student_signature,
        }
    }

    pub fn image_mut(&mut self, slot: ImageSlot) -> &mut String {
        match slot {
            ImageSlot::SchoolLogo => &mut self.school_logo,
            ImageSlot::StudentPhoto => &mut self.student_photo,
            ImageSlot::StudentSignature => &mut self.student_signature,
        }
    }

    pub fn apply_choice(&mut self, choice: Choice) {
        match choice {
            Choice::ExamCategory(v) => self.exam_category = v,
            Choice::ExamType(v) => self.exam_type = v,
            Choice::Category(v) => self.category = v,
            Choice::Gender(v) => self.gender = v,
        }
    }

    pub fn subject(&self, id: &SubjectId) -> Option<&SubjectRow> {
        self.subjects.iter().find(|row| &row.id == id)
    }
}
