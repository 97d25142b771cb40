//! Context initialization tables.
//!
//! Each table holds one row per init type in the order B, P, I. A value of
//! [`CNU`] initializes the equiprobable state regardless of QP.

/// "Context not used" init value.
pub const CNU: u8 = 154;

pub(crate) const INIT_SPLIT_FLAG: [[u8; 3]; 3] = [
    [107, 139, 126],
    [107, 139, 126],
    [139, 141, 157],
];

pub(crate) const INIT_SKIP_FLAG: [[u8; 3]; 3] = [
    [197, 185, 201],
    [197, 185, 201],
    [CNU, CNU, CNU],
];

pub(crate) const INIT_MERGE_FLAG: [[u8; 1]; 3] = [[154], [110], [CNU]];

pub(crate) const INIT_MERGE_IDX: [[u8; 1]; 3] = [[137], [122], [CNU]];

pub(crate) const INIT_PART_SIZE: [[u8; 3]; 3] = [
    [154, 139, 154],
    [154, 139, 154],
    [184, CNU, CNU],
];

pub(crate) const INIT_CU_AMP_POS: [[u8; 1]; 3] = [[154], [154], [CNU]];

pub(crate) const INIT_PRED_MODE: [[u8; 1]; 3] = [[134], [149], [CNU]];

pub(crate) const INIT_INTRA_PRED_MODE: [[u8; 1]; 3] = [[183], [154], [184]];

pub(crate) const INIT_CHROMA_PRED_MODE: [[u8; 2]; 3] = [[152, 139], [152, 139], [63, 139]];

pub(crate) const INIT_INTER_DIR: [[u8; 5]; 3] = [
    [95, 79, 63, 31, 31],
    [95, 79, 63, 31, 31],
    [CNU, CNU, CNU, CNU, CNU],
];

pub(crate) const INIT_MVD: [[u8; 2]; 3] = [[169, 198], [140, 198], [CNU, CNU]];

pub(crate) const INIT_REF_PIC: [[u8; 3]; 3] = [
    [153, 153, 153],
    [153, 153, 153],
    [CNU, CNU, CNU],
];

pub(crate) const INIT_DQP: [[u8; 3]; 3] = [
    [154, 154, 154],
    [154, 154, 154],
    [154, 154, 154],
];

// Luma contexts 0..5, chroma contexts 5..10
pub(crate) const INIT_QT_CBF: [[u8; 10]; 3] = [
    [153, 111, CNU, CNU, CNU, 149, 92, 167, 154, 154],
    [153, 111, CNU, CNU, CNU, 149, 107, 167, 154, 154],
    [111, 141, CNU, CNU, CNU, 94, 138, 182, 154, 154],
];

pub(crate) const INIT_QT_ROOT_CBF: [[u8; 1]; 3] = [[79], [79], [CNU]];

pub(crate) const INIT_SIG_CG_FLAG: [[u8; 4]; 3] = [
    [121, 140, 61, 154],
    [121, 140, 61, 154],
    [91, 171, 134, 141],
];

// 27 luma contexts followed by 15 chroma contexts
pub(crate) const INIT_SIG_FLAG: [[u8; 42]; 3] = [
    [
        170, 154, 139, 153, 139, 123, 123, 63, 124, 166, 183, 140, 136, 153, 154, 166, 183, 140,
        136, 153, 154, 166, 183, 140, 136, 153, 154, 170, 153, 138, 138, 122, 121, 122, 121, 167,
        151, 183, 140, 151, 183, 140,
    ],
    [
        155, 154, 139, 153, 139, 123, 123, 63, 153, 166, 183, 140, 136, 153, 154, 166, 183, 140,
        136, 153, 154, 166, 183, 140, 136, 153, 154, 170, 153, 123, 123, 107, 121, 107, 121, 167,
        151, 183, 140, 151, 183, 140,
    ],
    [
        111, 111, 125, 110, 110, 94, 124, 108, 124, 107, 125, 141, 179, 153, 125, 107, 125, 141,
        179, 153, 125, 107, 125, 141, 179, 153, 125, 140, 139, 182, 182, 152, 136, 152, 136, 153,
        136, 139, 111, 136, 139, 111,
    ],
];

// Shared by the last X and last Y groups: 15 luma then 15 chroma contexts
pub(crate) const INIT_LAST: [[u8; 30]; 3] = [
    [
        125, 110, 124, 110, 95, 94, 125, 111, 111, 79, 125, 126, 111, 111, 79, 108, 123, 93,
        CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
    [
        125, 110, 94, 110, 95, 79, 125, 111, 110, 78, 110, 111, 111, 95, 94, 108, 123, 108,
        CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
    [
        110, 110, 124, 125, 140, 153, 125, 127, 140, 109, 111, 143, 127, 111, 79, 108, 123, 63,
        CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
];

// 16 luma then 8 chroma contexts
pub(crate) const INIT_ONE_FLAG: [[u8; 24]; 3] = [
    [
        154, 196, 167, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121, 136, 137, 169, 194,
        166, 167, 154, 167, 137, 182,
    ],
    [
        154, 196, 196, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121, 136, 122, 169, 208,
        166, 167, 154, 152, 167, 182,
    ],
    [
        140, 92, 137, 138, 140, 152, 138, 139, 153, 74, 149, 92, 139, 107, 122, 152, 140, 179,
        166, 182, 140, 227, 122, 197,
    ],
];

// 4 luma then 2 chroma contexts
pub(crate) const INIT_ABS_FLAG: [[u8; 6]; 3] = [
    [107, 167, 91, 107, 107, 167],
    [107, 167, 91, 122, 107, 167],
    [138, 153, 136, 167, 152, 152],
];

pub(crate) const INIT_MVP_IDX: [[u8; 1]; 3] = [[168], [168], [CNU]];

pub(crate) const INIT_TRANS_SUBDIV_FLAG: [[u8; 3]; 3] = [
    [224, 167, 122],
    [124, 138, 94],
    [153, 138, 138],
];

pub(crate) const INIT_ALF_CTRL_FLAG: [[u8; 1]; 3] = [[102], [102], [118]];

pub(crate) const INIT_ALF_FLAG: [[u8; 1]; 3] = [[118], [102], [102]];

pub(crate) const INIT_ALF_UVLC: [[u8; 2]; 3] = [[140, 154], [154, 154], [154, 154]];

pub(crate) const INIT_ALF_SVLC: [[u8; 3]; 3] = [
    [187, 154, 159],
    [141, 154, 189],
    [141, 154, 189],
];

pub(crate) const INIT_SAO_FLAG: [[u8; 1]; 3] = [[119], [102], [102]];

pub(crate) const INIT_SAO_UVLC: [[u8; 2]; 3] = [[61, 154], [154, 154], [164, 154]];

pub(crate) const INIT_SAO_SVLC: [[u8; 3]; 3] = [
    [171, 154, 140],
    [155, 154, 139],
    [170, 154, 139],
];

pub(crate) const INIT_SAO_MERGE_LEFT_FLAG: [[u8; 3]; 3] = [
    [153, 153, 153],
    [153, 153, 153],
    [153, 153, 153],
];

pub(crate) const INIT_SAO_MERGE_UP_FLAG: [[u8; 1]; 3] = [[153], [153], [175]];

pub(crate) const INIT_SAO_TYPE_IDX: [[u8; 2]; 3] = [[160, CNU], [185, CNU], [200, CNU]];
