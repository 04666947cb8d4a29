//! Marketplace views.
//!
//! Thin components; each receives the read-only session and derives a few
//! status lines from it. The interesting work happens in the session core.

use leptos::prelude::*;

use crate::app::Session;
use crate::models::ConnectionStatus;

fn chain_line(status: &ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Ready => "Chain connection ready".to_string(),
        ConnectionStatus::Connecting => "Connecting to chain...".to_string(),
        ConnectionStatus::Failed(err) => format!("Chain connection failed: {err}"),
        ConnectionStatus::Disconnected => "Chain disconnected".to_string(),
    }
}

fn contract_line(session: Session, logical_name: &'static str, ready: &'static str) -> impl Fn() -> String {
    move || {
        if session.get().contract(logical_name).is_some() {
            ready.to_string()
        } else {
            "Waiting for contract bindings...".to_string()
        }
    }
}

/// Marketplace landing page.
#[component]
pub fn HomeView(session: Session) -> impl IntoView {
    view! {
        <section class="view">
            <h2>"Marketplace"</h2>
            <p class="statusLine">{move || chain_line(&session.get().chain)}</p>
            <p class="statusLine">
                {move || {
                    let session = session.get();
                    match &session.contracts {
                        Some(registry) if session.contracts_ready() && !registry.is_empty() => {
                            format!("Listings are live ({} contracts bound)", registry.len())
                        }
                        _ => "Listings unavailable until the chain is ready".to_string(),
                    }
                }}
            </p>
        </section>
    }
}

/// NFT minting view.
#[component]
pub fn MintView(session: Session) -> impl IntoView {
    view! {
        <section class="view">
            <h2>"Mint"</h2>
            <p class="statusLine">{contract_line(session, "erc721", "Minting available")}</p>
        </section>
    }
}

/// Listing creation view.
#[component]
pub fn ListNftView(session: Session) -> impl IntoView {
    view! {
        <section class="view">
            <h2>"Create a listing"</h2>
            <p class="statusLine">
                {contract_line(session, "nft_lending", "Listing creation available")}
            </p>
        </section>
    }
}

/// Fractionalisation view. Only rendered with a connected wallet; the
/// binder shows [`ConnectWalletNotice`] otherwise.
#[component]
pub fn FractionaliseView(session: Session) -> impl IntoView {
    view! {
        <section class="view">
            <h2>"Fractionalise"</h2>
            <p class="statusLine">
                {move || {
                    session
                        .get()
                        .wallet
                        .account_address()
                        .map(|address| format!("Fractionalising as {address}"))
                        .unwrap_or_default()
                }}
            </p>
            <p class="statusLine">
                {contract_line(session, "fractionalizer", "Fractionaliser bound")}
            </p>
        </section>
    }
}

/// Placeholder rendered on the guarded route without a wallet account.
#[component]
pub fn ConnectWalletNotice() -> impl IntoView {
    view! {
        <section class="view connectNotice">
            <p>"Connect your wallet"</p>
        </section>
    }
}

/// Account profile view.
#[component]
pub fn ProfileView(session: Session, address: String) -> impl IntoView {
    let shown = address.clone();
    let own_balance = move || {
        let session = session.get();
        match (&session.balance, session.wallet.account_address()) {
            (Some(snapshot), Some(account)) if account == address && snapshot.is_for(account) => {
                snapshot.display()
            }
            _ => String::new(),
        }
    };

    view! {
        <section class="view">
            <h2>"Profile"</h2>
            <p class="statusLine">{shown}</p>
            <p class="statusLine">{own_balance}</p>
        </section>
    }
}

/// Listing detail view.
#[component]
pub fn ListingDetailView(session: Session, id: String) -> impl IntoView {
    view! {
        <section class="view">
            <h2>{format!("Listing #{id}")}</h2>
            <p class="statusLine">
                {contract_line(session, "nft_lending", "Listing data available")}
            </p>
        </section>
    }
}

/// Designated error view; every unmatched path lands here.
#[component]
pub fn ErrorView() -> impl IntoView {
    view! {
        <section class="view">
            <h2>"Page not found"</h2>
            <button on:click=move |_| crate::models::AppRoute::Home.push()>
                "Back to the marketplace"
            </button>
        </section>
    }
}
