// Multi-angle analysis: request validation, per-angle workers and report assembly

use crate::core::config::Config;
use crate::core::video_pipeline::VideoPipeline;
use crate::models::capture::{DetectedFrame, VideoFormat};
use crate::models::report::{
    AnalysisError, AnalysisRequest, AnalysisResult, PerAngleResult, Report, UserMetadata,
    VideoAngle,
};
use crate::platform::capture::FrameSource;
use crate::platform::pose::PoseDetector;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Entry point of the analysis service
pub struct PostureAnalyzer {
    config: Arc<Config>,
    pipeline: Arc<VideoPipeline>,
    frame_source: Arc<dyn FrameSource>,
    pose_detector: Arc<dyn PoseDetector>,
}

impl PostureAnalyzer {
    /// Create an analyzer, rejecting invalid configuration up front
    pub fn new(
        config: Config,
        frame_source: Arc<dyn FrameSource>,
        pose_detector: Arc<dyn PoseDetector>,
    ) -> AnalysisResult<Self> {
        config.validate()?;

        info!("Posture analyzer ready ({})", pose_detector.model_info());

        Ok(Self {
            pipeline: Arc::new(VideoPipeline::new(&config)),
            config: Arc::new(config),
            frame_source,
            pose_detector,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode, detect and analyze every uploaded video, one worker per angle.
    ///
    /// The request is validated completely before any video is touched. If any
    /// angle fails the whole request fails, after all workers have finished.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResult<Report> {
        let angles = self.validate_request(&request)?;

        info!(
            "Analyzing {} video(s): {}",
            angles.len(),
            angles.iter().map(VideoAngle::as_str).collect::<Vec<_>>().join(", ")
        );

        let jobs: Vec<_> = angles
            .into_iter()
            .zip(request.videos)
            .map(|(angle, video)| {
                let frame_source = Arc::clone(&self.frame_source);
                let pose_detector = Arc::clone(&self.pose_detector);
                let pipeline = Arc::clone(&self.pipeline);

                let job = move || {
                    let frames = frame_source
                        .decode(&video.data)
                        .map_err(|source| AnalysisError::Capture { angle, source })?;
                    debug!("Decoded {} frames from {}", frames.len(), video.filename);

                    let detected = frames
                        .into_iter()
                        .map(|frame| {
                            let detection = pose_detector
                                .detect(&frame.image)
                                .map_err(|source| AnalysisError::Detection { angle, source })?;
                            Ok::<_, AnalysisError>(DetectedFrame { frame, detection })
                        })
                        .collect::<AnalysisResult<Vec<_>>>()?;

                    pipeline.process(angle, &detected)
                };
                (angle, job)
            })
            .collect();

        self.run_angles(jobs, request.user_metadata).await
    }

    /// Analyze frame sequences whose pose detection already ran, keyed by angle label
    pub async fn analyze_detected(
        &self,
        videos: Vec<(String, Vec<DetectedFrame>)>,
        user_metadata: UserMetadata,
    ) -> AnalysisResult<Report> {
        if videos.is_empty() {
            return Err(AnalysisError::NoVideos);
        }
        if videos.len() > self.config.max_videos {
            return Err(AnalysisError::TooManyVideos {
                count: videos.len(),
                max: self.config.max_videos,
            });
        }
        let angles = parse_angles(videos.iter().map(|(label, _)| label.as_str()))?;
        user_metadata.validate()?;

        let jobs: Vec<_> = angles
            .into_iter()
            .zip(videos)
            .map(|(angle, (_, frames))| {
                let pipeline = Arc::clone(&self.pipeline);
                (angle, move || pipeline.process(angle, &frames))
            })
            .collect();

        self.run_angles(jobs, user_metadata).await
    }

    /// Check a request and resolve its angle labels, in request order
    pub fn validate_request(&self, request: &AnalysisRequest) -> AnalysisResult<Vec<VideoAngle>> {
        let config = &self.config;

        if request.videos.is_empty() {
            return Err(AnalysisError::NoVideos);
        }
        if request.videos.len() > config.max_videos {
            return Err(AnalysisError::TooManyVideos {
                count: request.videos.len(),
                max: config.max_videos,
            });
        }
        if request.videos.len() != request.angles.len() {
            return Err(AnalysisError::AngleCountMismatch {
                videos: request.videos.len(),
                angles: request.angles.len(),
            });
        }

        let angles = parse_angles(request.angles.iter().map(String::as_str))?;

        for video in &request.videos {
            match VideoFormat::from_filename(&video.filename) {
                Some(format) if config.allowed_formats.contains(&format) => {}
                _ => return Err(AnalysisError::UnsupportedFormat(video.filename.clone())),
            }

            if video.size() > config.max_file_size_bytes {
                return Err(AnalysisError::FileTooLarge {
                    filename: video.filename.clone(),
                    size: video.size(),
                    max: config.max_file_size_bytes,
                });
            }
        }

        request.user_metadata.validate()?;

        Ok(angles)
    }

    /// Run one blocking worker per angle and wait for all of them before
    /// deciding the outcome
    async fn run_angles<F>(
        &self,
        jobs: Vec<(VideoAngle, F)>,
        user_metadata: UserMetadata,
    ) -> AnalysisResult<Report>
    where
        F: FnOnce() -> AnalysisResult<PerAngleResult> + Send + 'static,
    {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(angle, job)| {
                let handle = tokio::task::spawn_blocking(
                    move || -> AnalysisResult<(PerAngleResult, f64)> {
                        let started = Instant::now();
                        let result = job()?;
                        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                        info!(
                            "Finished {} video: {}/{} usable frames in {:.1}ms",
                            angle,
                            result.metadata.frames_usable,
                            result.metadata.frames_sampled,
                            elapsed_ms
                        );
                        Ok((result, elapsed_ms))
                    },
                );
                (angle, handle)
            })
            .collect();

        // Barrier: every worker runs to completion before any failure is reported
        let mut outcomes = Vec::with_capacity(handles.len());
        for (angle, handle) in handles {
            let outcome = handle
                .await
                .map_err(|e| {
                    AnalysisError::TaskFailed(format!("Task join error for {} video: {}", angle, e))
                })
                .and_then(|result| result);
            if let Err(e) = &outcome {
                error!("Analysis of {} video failed: {}", angle, e);
            }
            outcomes.push(outcome);
        }

        let results = outcomes.into_iter().collect::<AnalysisResult<Vec<_>>>()?;
        let report = Report::new(results, user_metadata);

        info!(
            "Report ready for {} angle(s) in {:.1}ms",
            report.len(),
            report.total_processing_time_ms()
        );

        Ok(report)
    }
}

/// Resolve labels to angles, rejecting unknown and repeated ones
fn parse_angles<'a>(labels: impl Iterator<Item = &'a str>) -> AnalysisResult<Vec<VideoAngle>> {
    let angles = labels
        .map(str::parse::<VideoAngle>)
        .collect::<AnalysisResult<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for angle in &angles {
        if !seen.insert(*angle) {
            return Err(AnalysisError::DuplicateAngle(*angle));
        }
    }

    Ok(angles)
}
