//! Lookup data behind skill suggestions and job recommendations.
//!
//! Both catalogs are traits so a real source (a jobs API, a skills taxonomy
//! service) can replace the built-in tables without touching the handlers.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCategory {
    pub id: String,
    pub name: String,
    /// Lowercase fragments of a job title that make this category relevant.
    #[serde(skip)]
    pub title_keywords: Vec<String>,
    pub skills: Vec<String>,
}

pub trait SkillCatalog: Send + Sync {
    /// Every category, in display order.
    fn categories(&self) -> &[SkillCategory];

    /// Categories whose keywords occur in `job_title` (case-insensitive).
    /// A title that matches nothing gets every category; an empty title
    /// gets none.
    fn relevant_categories(&self, job_title: &str) -> Vec<&SkillCategory> {
        let title = job_title.trim().to_lowercase();
        if title.is_empty() {
            return Vec::new();
        }
        let matched: Vec<&SkillCategory> = self
            .categories()
            .iter()
            .filter(|c| c.title_keywords.iter().any(|k| title.contains(k.as_str())))
            .collect();
        if matched.is_empty() {
            self.categories().iter().collect()
        } else {
            matched
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOpening {
    pub id: String,
    pub title: String,
    pub company: String,
    pub match_score: u32,
    pub skills: Vec<String>,
    pub location: String,
}

pub trait JobCatalog: Send + Sync {
    fn openings(&self) -> Vec<JobOpening>;
}

// ─── Built-in tables ─────────────────────────────────────────────────────

const SKILL_TABLE: &[(&str, &str, &[&str], &[&str])] = &[
    (
        "software-development",
        "Software Development",
        &["developer", "engineer", "programmer"],
        &[
            "React", "TypeScript", "Node.js", "GraphQL", "REST API", "Git", "CI/CD",
            "Docker", "Kubernetes", "AWS", "Azure", "GCP", "Microservices",
            "Test-Driven Development", "Agile", "Scrum", "DevOps",
        ],
    ),
    (
        "data-science",
        "Data Science",
        &["data", "analyst", "scientist"],
        &[
            "Python", "R", "SQL", "Machine Learning", "Deep Learning", "TensorFlow",
            "PyTorch", "Pandas", "NumPy", "Data Visualization", "Tableau", "Power BI",
            "Big Data", "Hadoop", "Spark", "Statistical Analysis",
        ],
    ),
    (
        "design",
        "Design",
        &["design", "ux", "ui"],
        &[
            "UI Design", "UX Design", "User Research", "Wireframing", "Prototyping",
            "Figma", "Adobe XD", "Sketch", "Illustrator", "Photoshop",
            "Design Systems", "Responsive Design", "Accessibility",
        ],
    ),
    (
        "product-management",
        "Product Management",
        &["product", "manager"],
        &[
            "Product Strategy", "Market Research", "User Stories", "Roadmapping",
            "A/B Testing", "Analytics", "KPIs", "OKRs", "Competitive Analysis",
            "Customer Development", "Prioritization", "Stakeholder Management",
        ],
    ),
    (
        "marketing",
        "Marketing",
        &["market", "growth", "content"],
        &[
            "Digital Marketing", "Content Marketing", "SEO", "SEM", "Social Media Marketing",
            "Email Marketing", "Growth Hacking", "Marketing Automation", "Google Analytics",
            "Conversion Optimization", "Brand Strategy", "Customer Acquisition",
        ],
    ),
];

const JOB_TABLE: &[(&str, &str, &str, u32, &[&str], &str)] = &[
    ("1", "Frontend Developer", "TechCorp", 85, &["React", "TypeScript", "CSS", "HTML"], "Remote"),
    ("2", "Full Stack Engineer", "InnovateSoft", 78, &["React", "Node.js", "MongoDB", "Express"], "New York, NY"),
    ("3", "UI/UX Designer", "DesignHub", 92, &["Figma", "UI Design", "User Research", "Prototyping"], "San Francisco, CA"),
    ("4", "Product Manager", "ProductLabs", 75, &["Agile", "Product Strategy", "User Stories", "Roadmapping"], "Chicago, IL"),
    ("5", "Data Scientist", "DataInsights", 88, &["Python", "Machine Learning", "SQL", "Data Visualization"], "Boston, MA"),
];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub struct StaticSkillCatalog {
    categories: Vec<SkillCategory>,
}

impl Default for StaticSkillCatalog {
    fn default() -> Self {
        let categories = SKILL_TABLE
            .iter()
            .map(|(id, name, keywords, skills)| SkillCategory {
                id: id.to_string(),
                name: name.to_string(),
                title_keywords: owned(keywords),
                skills: owned(skills),
            })
            .collect();
        Self { categories }
    }
}

impl SkillCatalog for StaticSkillCatalog {
    fn categories(&self) -> &[SkillCategory] {
        &self.categories
    }
}

#[derive(Default)]
pub struct StaticJobCatalog;

impl JobCatalog for StaticJobCatalog {
    fn openings(&self) -> Vec<JobOpening> {
        JOB_TABLE
            .iter()
            .map(|(id, title, company, match_score, skills, location)| JobOpening {
                id: id.to_string(),
                title: title.to_string(),
                company: company.to_string(),
                match_score: *match_score,
                skills: owned(skills),
                location: location.to_string(),
            })
            .collect()
    }
}
