#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod epoch;
pub use epoch::Epoch;

mod block;
pub use block::{BlockRef, ChainHeads};

mod window;
pub use window::{SubmissionTiming, WindowCalculator};

mod output;
pub use output::{DerivedOutput, OutputCommitment};

mod challenge;
pub use challenge::{Challenge, ChallengeStatus};

mod tx;
pub use tx::{TxHandle, TxStatus};

mod bond;
pub use bond::{percent_to_bps, BondIntent, BondIntentError, BondState, MAX_BPS};
