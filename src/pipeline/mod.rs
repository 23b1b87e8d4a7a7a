pub mod stage1_convert;
pub mod stage2_normalize;
pub mod stage3_fit;
pub mod stage4_score;
pub mod stage5_report;
