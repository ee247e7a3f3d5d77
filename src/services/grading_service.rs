use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            grading::{submission_target_key, validate_grade},
            GradeStatus, Grading, Submission, SubmissionKind,
        },
        dto::{
            request::{CreateSubmissionRequest, GradeRequest},
            response::SubmissionDto,
        },
    },
    repositories::{GradingRepository, SubmissionRepository},
};

pub struct GradingService {
    submissions: Arc<dyn SubmissionRepository>,
    gradings: Arc<dyn GradingRepository>,
}

impl GradingService {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        gradings: Arc<dyn GradingRepository>,
    ) -> Self {
        Self {
            submissions,
            gradings,
        }
    }

    pub async fn submit_work(
        &self,
        user_id: &str,
        request: CreateSubmissionRequest,
    ) -> AppResult<Submission> {
        request.validate()?;

        let submission = Submission::new(
            user_id,
            request.kind,
            request.assignment_id,
            request.title,
            request.content.trim(),
        );
        self.submissions.create(submission).await
    }

    /// First grade wins; any later grade for the same submission is `AlreadyGraded`.
    pub async fn grade_submission(
        &self,
        submission_id: &str,
        request: GradeRequest,
        grader_id: &str,
    ) -> AppResult<Grading> {
        validate_grade(request.grade)?;

        let submission = self
            .submissions
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Submission with id '{}' not found", submission_id))
            })?;

        let grading = Grading::for_submission(
            &submission.id,
            &submission.user_id,
            grader_id,
            request.grade,
            request.feedback,
        )?;
        let grading = self.gradings.insert_if_ungraded(grading).await?;

        log::info!(
            "Submission {} graded {} by {}",
            submission.id,
            grading.grade,
            grader_id
        );
        Ok(grading)
    }

    pub async fn grade_status(&self, submission_id: &str) -> AppResult<GradeStatus> {
        let grading = self
            .gradings
            .find_by_target_key(&submission_target_key(submission_id))
            .await?;
        Ok(GradeStatus::from(grading))
    }

    /// Lists submissions newest first, each with its current grade.
    pub async fn list_submissions(
        &self,
        kind: Option<SubmissionKind>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<SubmissionDto>, i64)> {
        let (submissions, total) = self.submissions.list_submissions(kind, offset, limit).await?;

        let mut listed = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let grading = self.grade_status(&submission.id).await?;
            listed.push(SubmissionDto {
                submission,
                grading,
            });
        }

        Ok((listed, total))
    }

    pub async fn find_submission(&self, submission_id: &str) -> AppResult<Submission> {
        self.submissions
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Submission with id '{}' not found", submission_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::domain::SubmissionKind, repositories::Repositories};

    fn service() -> GradingService {
        let repos = Repositories::in_memory();
        GradingService::new(repos.submissions, repos.gradings)
    }

    async fn project(service: &GradingService) -> Submission {
        service
            .submit_work(
                "student-1",
                CreateSubmissionRequest {
                    kind: SubmissionKind::Project,
                    assignment_id: None,
                    title: Some("Capstone".to_string()),
                    content: "https://github.com/student/capstone".to_string(),
                },
            )
            .await
            .unwrap()
    }

    fn grade(value: f64) -> GradeRequest {
        GradeRequest {
            grade: value,
            feedback: Some("nice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_grade_then_status() {
        let service = service();
        let submission = project(&service).await;

        assert_eq!(
            service.grade_status(&submission.id).await.unwrap(),
            GradeStatus::Ungraded
        );

        let grading = service
            .grade_submission(&submission.id, grade(92.0), "admin-1")
            .await
            .unwrap();
        assert_eq!(grading.student_id, "student-1");

        let status = service.grade_status(&submission.id).await.unwrap();
        assert!(matches!(status, GradeStatus::Graded { grade, ref grader_id, .. }
            if grade == 92.0 && grader_id == "admin-1"));
    }

    #[tokio::test]
    async fn test_second_grade_is_rejected() {
        let service = service();
        let submission = project(&service).await;

        service
            .grade_submission(&submission.id, grade(60.0), "admin-1")
            .await
            .unwrap();
        let err = service
            .grade_submission(&submission.id, grade(99.0), "admin-2")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyGraded(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_grades_first_one_wins() {
        let service = Arc::new(service());
        let submission = project(&service).await;

        let handles: Vec<_> = [(70.0, "admin-1"), (95.0, "admin-2")]
            .into_iter()
            .map(|(value, grader)| {
                let service = Arc::clone(&service);
                let submission_id = submission.id.clone();
                tokio::spawn(async move {
                    service
                        .grade_submission(&submission_id, grade(value), grader)
                        .await
                })
            })
            .collect();

        let mut winners = Vec::new();
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(grading) => winners.push(grading),
                Err(AppError::AlreadyGraded(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(rejected, 1);
        let winner = &winners[0];
        match service.grade_status(&submission.id).await.unwrap() {
            GradeStatus::Graded {
                grade, grader_id, ..
            } => {
                assert_eq!(grade, winner.grade);
                assert_eq!(grader_id, winner.grader_id);
            }
            GradeStatus::Ungraded => panic!("submission should be graded"),
        }
    }

    #[tokio::test]
    async fn test_list_submissions_filters_by_kind_and_attaches_grades() {
        let service = service();
        let graded = project(&service).await;
        service
            .grade_submission(&graded.id, grade(81.0), "admin-1")
            .await
            .unwrap();
        service
            .submit_work(
                "student-2",
                CreateSubmissionRequest {
                    kind: SubmissionKind::Assignment,
                    assignment_id: Some("a-1".to_string()),
                    title: None,
                    content: "answer".to_string(),
                },
            )
            .await
            .unwrap();

        let (all, total) = service.list_submissions(None, 0, 20).await.unwrap();
        assert_eq!((all.len(), total), (2, 2));

        let (projects, total) = service
            .list_submissions(Some(SubmissionKind::Project), 0, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(projects[0].submission.id, graded.id);
        assert!(matches!(projects[0].grading, GradeStatus::Graded { grade, .. } if grade == 81.0));

        let (page, total) = service.list_submissions(None, 1, 20).await.unwrap();
        assert_eq!((page.len(), total), (1, 2));
    }

    #[tokio::test]
    async fn test_out_of_range_grade_is_rejected_before_lookup() {
        let service = service();

        let err = service
            .grade_submission("does-not-matter", grade(101.0), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GradeOutOfRange(g) if g == 101.0));
    }

    #[tokio::test]
    async fn test_grading_unknown_submission() {
        let service = service();
        let err = service
            .grade_submission("missing", grade(50.0), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_submission_content_fails_validation() {
        let service = service();
        let err = service
            .submit_work(
                "student-1",
                CreateSubmissionRequest {
                    kind: SubmissionKind::Assignment,
                    assignment_id: Some("a-1".to_string()),
                    title: None,
                    content: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
