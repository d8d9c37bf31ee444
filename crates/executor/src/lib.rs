pub mod fees;
pub mod nonce;
pub mod sender;
pub mod settlement;
pub mod swap;
pub mod tx_builder;

pub use fees::{FeeStrategy, GasPrice, GasPriceSource};
pub use nonce::NonceManager;
pub use sender::TxSender;
pub use settlement::ConfirmationTracker;
pub use swap::{BuyOutcome, BuyReport, SwapExecutor, SwapPlan, SwapPolicy};
pub use tx_builder::{BuyEthParams, SwapTxBuilder};
