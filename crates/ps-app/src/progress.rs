use ps_sim::SimProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingDocuments,
    CheckingCache,
    LoadingCachedResult,
    BuildingPack,
    FlatteningDrive,
    Simulating,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingDocuments => "load",
            RunStage::CheckingCache => "cache",
            RunStage::LoadingCachedResult => "cache-load",
            RunStage::BuildingPack => "pack",
            RunStage::FlatteningDrive => "drive",
            RunStage::Simulating => "simulate",
            RunStage::Completed => "done",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationProgress {
    pub step: usize,
    pub total_steps: usize,
    pub sim_time_s: f64,
    pub fraction_complete: f64,
    pub limited_steps: usize,
}

impl From<&SimProgress> for SimulationProgress {
    fn from(p: &SimProgress) -> Self {
        Self {
            step: p.step,
            total_steps: p.total_steps,
            sim_time_s: p.sim_time_s,
            fraction_complete: p.fraction_complete(),
            limited_steps: p.limited_steps,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub simulation: Option<SimulationProgress>,
}
