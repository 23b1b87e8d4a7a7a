// Health-prevalent (MH) and health-scarce (MN) species from Gupta et al. 2020.

use crate::error::Side;

const HEALTHY_SPECIES_DEFAULT: &[&str] = &[
    "s__Alistipes_senegalensis",
    "s__Bacteroidales_bacterium_ph8",
    "s__Bifidobacterium_adolescentis",
    "s__Bifidobacterium_angulatum",
    "s__Bifidobacterium_catenulatum",
    "s__Lachnospiraceae_bacterium_8_1_57FAA",
    "s__Sutterella_wadsworthensis",
];

const NON_HEALTHY_SPECIES_DEFAULT: &[&str] = &[
    "s__Anaerotruncus_colihominis",
    "s__Atopobium_parvulum",
    "s__Bifidobacterium_dentium",
    "s__Blautia_producta",
    "s__candidate_division_TM7_single_cell_isolate_TM7c",
    "s__Clostridiales_bacterium_1_7_47FAA",
    "s__Clostridium_asparagiforme",
    "s__Clostridium_bolteae",
    "s__Clostridium_citroniae",
    "s__Clostridium_clostridioforme",
    "s__Clostridium_hathewayi",
    "s__Clostridium_nexile",
    "s__Clostridium_ramosum",
    "s__Clostridium_symbiosum",
    "s__Eggerthella_lenta",
    "s__Erysipelotrichaceae_bacterium_2_2_44A",
    "s__Flavonifractor_plautii",
    "s__Fusobacterium_nucleatum",
    "s__Gemella_morbillorum",
    "s__Gemella_sanguinis",
    "s__Granulicatella_adiacens",
    "s__Holdemania_filiformis",
    "s__Klebsiella_pneumoniae",
    "s__Lachnospiraceae_bacterium_1_4_56FAA",
    "s__Lachnospiraceae_bacterium_2_1_58FAA",
    "s__Lachnospiraceae_bacterium_3_1_57FAA_CT1",
    "s__Lachnospiraceae_bacterium_5_1_57FAA",
    "s__Lachnospiraceae_bacterium_9_1_43BFAA",
    "s__Lactobacillus_salivarius",
    "s__Peptostreptococcus_stomatis",
    "s__Ruminococcaceae_bacterium_D16",
    "s__Ruminococcus_gnavus",
    "s__Solobacterium_moorei",
    "s__Streptococcus_anginosus",
    "s__Streptococcus_australis",
    "s__Streptococcus_gordonii",
    "s__Streptococcus_infantis",
    "s__Streptococcus_mitis_oralis_pneumoniae",
    "s__Streptococcus_sanguinis",
    "s__Streptococcus_vestibularis",
    "s__Subdoligranulum_sp_4_3_54A2FAA",
    "s__Subdoligranulum_variabile",
    "s__Veillonella_atypica",
];

pub fn default_species(side: Side) -> &'static [&'static str] {
    match side {
        Side::Healthy => HEALTHY_SPECIES_DEFAULT,
        Side::NonHealthy => NON_HEALTHY_SPECIES_DEFAULT,
    }
}
