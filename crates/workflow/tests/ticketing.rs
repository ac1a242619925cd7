mod support;

use classify::ErrorKind;
use support::*;
use workflow::Operation;

#[tokio::test]
async fn first_attempt_issues_once() {
    let transport = ScriptedTransport::new();
    transport
        .reply(Operation::ImportRecord, booking())
        .reply(Operation::Ticket, issued("5660000000001"));
    let terminals = ScriptedTerminals::default();

    let outcome = orchestrator(&transport, &terminals).ticket(PNR).await.unwrap();
    assert_eq!(outcome.ticket_numbers, vec!["5660000000001"]);
    assert_eq!(transport.calls_to(Operation::ImportRecord), 1);
    assert_eq!(transport.calls_to(Operation::Ticket), 1);
    assert_eq!(transport.payloads(Operation::Ticket)[0]["currency"], "UAH");
    assert_eq!(terminals.opened(), 0);
}

#[tokio::test]
async fn foid_rejection_applies_foid_once() {
    let transport = ScriptedTransport::new();
    transport
        .reply(Operation::ImportRecord, booking())
        .reply(Operation::ImportRecord, booking())
        .reply(Operation::Ticket, ticket_rejection("FOID IS REQUIRED FOR ALL PASSENGERS"))
        .reply(Operation::Ticket, issued("5660000000001"))
        .reply(Operation::ApplyFoid, ack());

    let outcome = orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap();
    assert_eq!(outcome.pnr.as_deref(), Some(PNR));
    assert_eq!(transport.calls_to(Operation::ApplyFoid), 1);
    assert_eq!(transport.calls_to(Operation::ImportRecord), 2);
    assert_eq!(transport.calls_to(Operation::Ticket), 2);
    assert_eq!(transport.payloads(Operation::ApplyFoid)[0]["passengers"][0], "BT1");
}

#[tokio::test]
async fn busy_then_foid_then_success() {
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.reply(Operation::ImportRecord, booking());
    }
    transport
        .reply(Operation::Ticket, ticket_rejection("PNR BUSY - RETRY"))
        .reply(Operation::Ticket, ticket_rejection("FOID REQUIRED"))
        .reply(Operation::Ticket, issued("5660000000001"))
        .reply(Operation::ApplyFoid, ack());

    orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap();
    assert_eq!(transport.calls_to(Operation::Ticket), 3);
    assert_eq!(transport.calls_to(Operation::ImportRecord) - 1, 2);
    assert_eq!(transport.calls_to(Operation::ApplyFoid), 1);
}

#[tokio::test]
async fn repeated_foid_rejection_propagates() {
    let transport = ScriptedTransport::new();
    transport
        .reply(Operation::ImportRecord, booking())
        .reply(Operation::ImportRecord, booking())
        .reply(Operation::Ticket, ticket_rejection("FOID REQUIRED"))
        .reply(Operation::Ticket, ticket_rejection("FOID REQUIRED AGAIN"))
        .reply(Operation::ApplyFoid, ack());

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TicketingFoidRequired);
    assert_eq!(err.message, "FOID REQUIRED AGAIN");
    assert_eq!(transport.calls_to(Operation::Ticket), 2);
}

#[tokio::test]
async fn unpriced_booking_has_no_currency() {
    let transport = ScriptedTransport::new();
    transport.reply(Operation::ImportRecord, universal_record(PNR, None));

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CouldNotRetrieveCurrency);
    assert_eq!(transport.calls_to(Operation::Ticket), 0);
}

#[tokio::test]
async fn price_without_currency_has_no_currency() {
    let transport = ScriptedTransport::new();
    transport.reply(Operation::ImportRecord, universal_record(PNR, Some("1000")));

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CouldNotRetrieveCurrency);
    assert_eq!(transport.calls_to(Operation::Ticket), 0);
}

#[tokio::test]
async fn vendor_fault_during_issue_propagates_unchanged() {
    let transport = ScriptedTransport::new();
    transport
        .reply(Operation::ImportRecord, booking())
        .fault(Operation::Ticket, fault("12009", "Tickets not issued"));

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .ticket(PNR)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TicketsNotIssued);
    assert_eq!(err.vendor_code.as_deref(), Some("12009"));
}
