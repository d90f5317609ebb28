pub mod analysis; // M1: Heuristic image analysis
pub mod report; // M2: Inference-to-report pipeline
pub mod sugar; // M3: Blood-sugar lab reports
