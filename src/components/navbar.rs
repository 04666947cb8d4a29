//! Navigation bar component.
//!
//! Renders the navigation tabs with the active-tab highlight and the minimal
//! wallet connect/disconnect affordance.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::AppContext;
use crate::config::{APP_NAME, NAV_ITEMS};
use crate::core::strategies::chain_name;
use crate::models::{ConnectorKind, WalletStatus};

/// Navigation bar with tabs and the wallet button.
#[component]
pub fn NavBar(active: Memo<Option<&'static str>>) -> impl IntoView {
    view! {
        <header class="navBar">
            <a class="logo" href="#/">{APP_NAME}</a>
            <nav class="navItems">
                {NAV_ITEMS
                    .iter()
                    .map(|item| {
                        let label = item.label;
                        view! {
                            <a
                                class="navBtn"
                                class:navBtnActive=move || active.get() == Some(label)
                                href=format!("#{}", item.path)
                            >
                                {label}
                            </a>
                        }
                    })
                    .collect::<Vec<_>>()}
            </nav>
            <ConnectButton />
        </header>
    }
}

/// Wallet connect/disconnect affordance.
///
/// Disconnected: one button per connector strategy. Connected: short
/// address, balance, and network; clicking disconnects.
#[component]
fn ConnectButton() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let session = ctx.session;
    let chain_id = ctx.chain_id;

    let connect = {
        let ctx = ctx.clone();
        move |kind: ConnectorKind| {
            let ctx = ctx.clone();
            spawn_local(async move {
                ctx.connect_wallet(kind).await;
            });
        }
    };
    let connect_injected = connect.clone();
    let connect_relay = connect.clone();
    let connect_hosted = connect;

    let disconnect = move |_: leptos::ev::MouseEvent| {
        let ctx = ctx.clone();
        spawn_local(async move {
            ctx.disconnect_wallet().await;
        });
    };

    view! {
        {move || {
            let wallet = session.get().wallet;
            let network = move || chain_id.get().map(chain_name).unwrap_or("—").to_string();
            let balance_line = move || {
                session
                    .get()
                    .balance
                    .map(|snapshot| snapshot.display())
                    .unwrap_or_default()
            };
            let error_line = move || {
                session
                    .get()
                    .wallet
                    .last_error
                    .map(|err| err.to_string())
                    .unwrap_or_default()
            };
            match wallet.status {
                WalletStatus::Idle => {
                    view! {
                        <div class="connectBtns">
                            <button
                                class="connectBtn"
                                on:click={
                                    let connect = connect_injected.clone();
                                    move |_| connect(ConnectorKind::Injected)
                                }
                            >
                                {ConnectorKind::Injected.label()}
                            </button>
                            <button
                                class="connectBtn"
                                on:click={
                                    let connect = connect_relay.clone();
                                    move |_| connect(ConnectorKind::RelayBased)
                                }
                            >
                                {ConnectorKind::RelayBased.label()}
                            </button>
                            <button
                                class="connectBtn"
                                on:click={
                                    let connect = connect_hosted.clone();
                                    move |_| connect(ConnectorKind::HostedBridge)
                                }
                            >
                                {ConnectorKind::HostedBridge.label()}
                            </button>
                            <span class="connectError">{error_line}</span>
                        </div>
                    }
                        .into_any()
                }
                WalletStatus::Connecting | WalletStatus::Disconnecting => {
                    view! { <div class="connectPending">{wallet.display_name()}</div> }.into_any()
                }
                WalletStatus::Connected => {
                    view! {
                        <div class="connectedBtn" on:click=disconnect.clone()>
                            <span class="address">{wallet.display_name()}</span>
                            <span class="balance">{balance_line}</span>
                            <span class="network">{network}</span>
                        </div>
                    }
                        .into_any()
                }
            }
        }}
    }
}
